use colored::Colorize;
use volley_config::ContractKind;
use volley_core::{Preset, BUILTIN_TARGETS};

use crate::report::outln;

/// Handle `volley presets`
pub fn handle_presets() {
    print!("{}", render_presets());
}

/// Handle `volley targets`
pub fn handle_targets() {
    print!("{}", render_targets());
}

pub fn render_presets() -> String {
    let mut out = String::new();
    for preset in Preset::ALL {
        outln!(out, "{}", preset.name().green().bold());
        outln!(out, "  {}", preset.description());
        outln!(out, "  {}", preset.profile().describe());
        let thresholds: Vec<String> = preset
            .thresholds()
            .iter()
            .map(|t| format!("{}: {}", t.metric, t.expression()))
            .collect();
        outln!(out, "  thresholds: {}", thresholds.join(", "));
    }
    out
}

fn contract_label(contract: ContractKind) -> &'static str {
    match contract {
        ContractKind::LabelScore => "label + score",
        ContractKind::Prediction => "prediction",
        ContractKind::Detections => "detections[]",
        ContractKind::StatusOnly => "status only",
        ContractKind::Custom => "custom",
    }
}

pub fn render_targets() -> String {
    let mut out = String::new();
    for target in BUILTIN_TARGETS {
        outln!(
            out,
            "{}  {}",
            target.name.green().bold(),
            target.function_name.cyan()
        );
        outln!(out, "  {}", target.description);
        outln!(
            out,
            "  payloads: {}  checks: {}",
            target.payload_file,
            contract_label(target.contract)
        );
    }
    out
}
