use trace_contract::lifecycle;

use crate::OutputFormat;

pub(crate) fn cmd_lifecycle(output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            println!("initial: {}", lifecycle::initial_state());
            for edge in lifecycle::edges() {
                println!(
                    "  {:<12} --{}--> {:<10} ({})",
                    edge.from, edge.transition, edge.to, edge.role
                );
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "initial": lifecycle::initial_state(),
                "edges": lifecycle::edges(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
            );
        }
    }
}
