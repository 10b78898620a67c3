//! Output formatting for the Strategy Resolution Agent CLI
//!
//! Plans, explanations and catalog reports render as JSON, YAML, or a
//! colored table.

use clap::ValueEnum;
use colored::Colorize;
use deploy_strategy_core::{
    resolve, Explanation, ResolvedPlan, RuleCatalog, StrategyError, WorkloadProfile,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::error::AgentError;

/// How many uncovered profiles a catalog report lists by name
const UNCOVERED_SAMPLE: usize = 10;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

fn render_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool, AgentError> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| AgentError::SerializationError(e.to_string()))?,
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|e| AgentError::SerializationError(e.to_string()))?,
        OutputFormat::Table => return Ok(false),
    };
    println!("{}", text);
    Ok(true)
}

/// Render a resolved plan
pub fn render_plan(plan: &ResolvedPlan, format: OutputFormat) -> Result<(), AgentError> {
    if render_serialized(plan, format)? {
        return Ok(());
    }

    let mut stdout = io::stdout();
    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Deployment Plan".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();
    writeln!(stdout).ok();

    let bundle = &plan.bundle;
    writeln!(stdout, "  {:<18} {}", "Platform:".dimmed(), bundle.platform_family.green().bold()).ok();
    writeln!(stdout, "  {:<18} {}", "Container base:".dimmed(), bundle.container_base).ok();
    writeln!(stdout, "  {:<18} {}", "Infra tooling:".dimmed(), bundle.infra_tooling).ok();
    if !bundle.security_controls.is_empty() {
        let controls: Vec<&str> = bundle.security_controls.iter().map(String::as_str).collect();
        writeln!(stdout, "  {:<18} {}", "Security:".dimmed(), controls.join(", ")).ok();
    }
    writeln!(
        stdout,
        "  {:<18} {} (${} - ${} / month)",
        "Cost band:".dimmed(),
        plan.cost_band.tier_name.yellow(),
        plan.cost_band.lower_bound,
        plan.cost_band.upper_bound
    )
    .ok();

    if let Some(chain) = &plan.failover_chain {
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Failover:".cyan().bold()).ok();
        for (position, entry) in ["primary", "secondary", "tertiary"]
            .iter()
            .zip(chain.entries().iter())
        {
            writeln!(
                stdout,
                "  {:<10} {:<32} RTO {:<5} RPO {}",
                position,
                entry.strategy_name,
                entry.rto.to_string(),
                entry.rpo
            )
            .ok();
        }
    }

    writeln!(stdout).ok();
    if !bundle.rationale.is_empty() {
        writeln!(stdout, "  {}", bundle.rationale.italic()).ok();
    }
    writeln!(
        stdout,
        "  {} rule {} (specificity {}), catalog {}",
        "Matched".dimmed(),
        plan.matched_rule_id.cyan(),
        plan.specificity,
        plan.catalog_version.dimmed()
    )
    .ok();

    stdout.flush().ok();
    Ok(())
}

/// Render a rule-by-rule explanation
pub fn render_explanation(
    explanation: &Explanation,
    format: OutputFormat,
) -> Result<(), AgentError> {
    if render_serialized(explanation, format)? {
        return Ok(());
    }

    let mut stdout = io::stdout();
    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Resolution Explanation".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();
    writeln!(stdout, "  {} {}", "Profile:".dimmed(), explanation.profile).ok();
    writeln!(stdout, "  {} {}", "Catalog:".dimmed(), explanation.catalog_version).ok();
    writeln!(stdout).ok();

    let selected = explanation.selected_rule_id.as_deref();
    for candidate in &explanation.candidates {
        let marker = if Some(candidate.rule_id.as_str()) == selected {
            "*".green().bold()
        } else if candidate.matched {
            "+".yellow()
        } else {
            "-".dimmed()
        };

        let detail = if candidate.matched {
            "matched".to_string()
        } else {
            let axes: Vec<&str> = candidate.mismatched_axes.iter().map(|a| a.as_str()).collect();
            format!("mismatch: {}", axes.join(", "))
        };

        writeln!(
            stdout,
            "{} {:>3}  {:<40} specificity {}  {}",
            marker,
            candidate.priority,
            candidate.rule_id,
            candidate.specificity,
            detail.dimmed()
        )
        .ok();
    }

    writeln!(stdout).ok();
    match selected {
        Some(rule_id) => {
            writeln!(stdout, "{} {}", "Selected:".green().bold(), rule_id).ok();
            if !explanation.shadowed_by_order.is_empty() {
                writeln!(
                    stdout,
                    "  {} {}",
                    "Shadowed by declaration order:".dimmed(),
                    explanation.shadowed_by_order.join(", ")
                )
                .ok();
            }
        }
        None => {
            writeln!(stdout, "{}", "No rule matches this profile".red().bold()).ok();
        }
    }

    stdout.flush().ok();
    Ok(())
}

/// Result of loading and auditing a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogReport {
    pub valid: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub rule_count: usize,
    pub failover_tiers: Vec<String>,
    pub cost_bands: Vec<String>,
    /// Profiles in the full cross-product that resolve to no plan
    pub uncovered_profiles: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncovered_examples: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogReport {
    /// Audit a loaded catalog against every possible profile
    pub fn from_catalog(catalog: &RuleCatalog, source: &str) -> Self {
        let uncovered: Vec<WorkloadProfile> = WorkloadProfile::cross_product()
            .filter(|profile| resolve(profile, catalog).is_err())
            .collect();

        Self {
            valid: true,
            source: source.to_string(),
            version: Some(catalog.fingerprint().to_string()),
            label: Some(catalog.label().to_string()),
            rule_count: catalog.len(),
            failover_tiers: catalog.failover().tiers().map(|t| t.to_string()).collect(),
            cost_bands: catalog
                .costs()
                .bands()
                .iter()
                .map(|b| b.tier_name.clone())
                .collect(),
            uncovered_profiles: uncovered.len(),
            uncovered_examples: uncovered
                .iter()
                .take(UNCOVERED_SAMPLE)
                .map(|p| p.to_string())
                .collect(),
            error_code: None,
            error: None,
        }
    }

    pub fn rejected(source: &str, error: &StrategyError) -> Self {
        Self {
            valid: false,
            source: source.to_string(),
            version: None,
            label: None,
            rule_count: 0,
            failover_tiers: Vec::new(),
            cost_bands: Vec::new(),
            uncovered_profiles: 0,
            uncovered_examples: Vec::new(),
            error_code: Some(error.code().to_string()),
            error: Some(error.to_string()),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<(), AgentError> {
        if render_serialized(self, format)? {
            return Ok(());
        }

        let mut stdout = io::stdout();
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Catalog Check".cyan().bold()).ok();
        writeln!(stdout, "{}", "=".repeat(60)).ok();
        writeln!(stdout, "  {} {}", "Source:".dimmed(), self.source).ok();
        writeln!(stdout).ok();

        if !self.valid {
            writeln!(
                stdout,
                "{} [{}] {}",
                "x".red(),
                self.error_code.as_deref().unwrap_or_default().dimmed(),
                self.error.as_deref().unwrap_or_default()
            )
            .ok();
            stdout.flush().ok();
            return Ok(());
        }

        writeln!(
            stdout,
            "{} Catalog {} loaded ({} rules)",
            "+".green(),
            self.label.as_deref().unwrap_or_default().bold(),
            self.rule_count
        )
        .ok();
        writeln!(
            stdout,
            "  {:<16} {}",
            "Version:".dimmed(),
            self.version.as_deref().unwrap_or_default()
        )
        .ok();
        writeln!(stdout, "  {:<16} {}", "Failover tiers:".dimmed(), self.failover_tiers.join(", ")).ok();
        writeln!(stdout, "  {:<16} {}", "Cost bands:".dimmed(), self.cost_bands.join(" < ")).ok();
        writeln!(stdout).ok();

        if self.uncovered_profiles == 0 {
            writeln!(stdout, "{} Every profile resolves to a plan", "+".green()).ok();
        } else {
            writeln!(
                stdout,
                "{} {} profile(s) resolve to no plan",
                "!".yellow(),
                self.uncovered_profiles.to_string().yellow()
            )
            .ok();
            for profile in &self.uncovered_examples {
                writeln!(stdout, "    {}", profile.dimmed()).ok();
            }
        }

        stdout.flush().ok();
        Ok(())
    }
}

/// Print an error in the requested format; tables go to stderr
pub fn render_error(error: &AgentError, format: OutputFormat) {
    let code = match error {
        AgentError::Strategy(e) => e.code().to_string(),
        AgentError::Remote { code, .. } => code.clone(),
        AgentError::InvalidInput(_) => "INVALID_INPUT".to_string(),
        AgentError::FileError(_) => "FILE_ERROR".to_string(),
        AgentError::ParseError(_) => "PARSE_ERROR".to_string(),
        AgentError::ConfigError(_) => "CONFIG_ERROR".to_string(),
        AgentError::SerializationError(_) | AgentError::InternalError(_) => {
            "INTERNAL_ERROR".to_string()
        }
    };

    let body = serde_json::json!({ "error": code, "message": error.to_string() });
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&body).ok(),
        OutputFormat::Yaml => serde_yaml::to_string(&body).ok(),
        OutputFormat::Table => None,
    };

    match rendered {
        Some(text) => println!("{}", text),
        None => eprintln!("{} [{}] {}", "x".red(), code.dimmed(), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_builtin_catalog_report() {
        let catalog = RuleCatalog::builtin().unwrap();
        let report = CatalogReport::from_catalog(&catalog, "built-in");
        assert!(report.valid);
        assert_eq!(report.rule_count, catalog.len());
        assert_eq!(report.uncovered_profiles, 0);
        assert!(report.uncovered_examples.is_empty());
    }

    #[test]
    fn test_rejected_report() {
        let err = StrategyError::catalog_load("rule 'x' has no bundle");
        let report = CatalogReport::rejected("catalog.yaml", &err);
        assert!(!report.valid);
        assert_eq!(report.error_code.as_deref(), Some("CATALOG_LOAD_ERROR"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("version").is_none());
    }
}
