// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use mipsim::{
    BindingTable, CliArgs, MipError, NodeSummary, ScenarioReport, SimulationConfig, VisitorTable,
    export_trace, run_scenario,
};
use std::process;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(args).await {
        error!("Simulation failed during {}: {}", e.phase(), e);
        process::exit(if e.is_precondition_violation() { 2 } else { 1 });
    }
}

async fn run(args: CliArgs) -> Result<(), MipError> {
    let config = SimulationConfig::from_cli(args)?;
    config.validate()?;

    println!("=== Mobile IP Simulation ===\n");
    config.print_summary();

    let report = run_scenario(&config).await?;
    print_report(&report);

    if let Some(path) = &config.trace_out {
        export_trace(&report.trace, path, config.trace_format)?;
        println!("✓ Trace written to {}", path.display());
    }

    info!("Simulation finished in state {}", report.final_state);
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    println!("=== Message Trace ===");
    print!("{}", report.trace);
    println!();

    print!("{}", NodeSummary(&report.node));
    println!();

    println!("Home Agent {}", report.home_agent);
    print!("{}", BindingTable(&report.bindings));
    println!();

    for agent in &report.visitors {
        println!("Foreign Agent {}", agent.foreign_agent);
        print!("{}", VisitorTable(&agent.entries));
        println!();
    }

    for delivery in &report.deliveries {
        println!(
            "✓ Delivered {} ({} routing, {} hop(s), {} unwrap(s))",
            delivery.received,
            delivery.method,
            delivery.hops.len(),
            delivery.unwraps
        );
    }
}
