//! CLI driver: selects a test configuration, builds a TestBed system,
//! runs the benchmark program for a cycle budget, and reports performance.
//!
//! Grounded on `original_source/ArmEmu/EmuPerfTest_Main.cpp`'s
//! `EmuPerfTestArgs`/`EmuPerfTestApp`: the same positional configuration
//! argument, `--cycles`/`-c`, and `--help[=configs]`/`-?`.

mod configuration;
mod program;
mod testbed;

use clap::Parser;
use log::info;

use configuration::Configuration;
use arm_emu_core::exec::TerminationReason;

const DEFAULT_CYCLES: u32 = 3_000_000;

#[derive(Parser)]
#[command(
    name = "arm-emu-cli",
    about = "An ARM emulation performance measurement tool.",
    disable_help_flag = true
)]
struct Args {
    /// Test configuration to run (default: ARMv2-Test).
    #[arg(value_enum)]
    config: Option<Configuration>,

    /// Number of loop iterations for the benchmark program.
    #[arg(short = 'c', long = "cycles")]
    cycles: Option<u32>,

    /// Show command line help. Pass `configs` to list valid configurations.
    #[arg(short = '?', long = "help", num_args = 0..=1, default_missing_value = "")]
    help: Option<String>,
}

fn print_help() {
    println!("An ARM emulation performance measurement tool.");
    println!();
    println!("USAGE:");
    println!("    arm-emu-cli [CONFIG] [--cycles <N>]");
    println!();
    println!("ARGS:");
    println!("    <CONFIG>    Test configuration to run (default: ARMv2-Test)");
    println!();
    println!("OPTIONS:");
    println!("    -c, --cycles <N>     Number of Dhrystone-style loop iterations to run");
    println!("    -?, --help[=TOPIC]   Show this help, or `configs` to list configurations");
}

fn print_configs() {
    let names: Vec<&str> = Configuration::ALL.iter().map(|c| c.name()).collect();
    println!("Configurations: {}", names.join(", "));
}

fn run(config: Configuration, cycles: u32) -> anyhow::Result<bool> {
    let program = program::assemble_benchmark()?;
    let mut system = testbed::build(config, &program, cycles)?;

    println!(
        "Selected {:?} processor.\nRunning {cycles} loops of the benchmark program...",
        config.processor()
    );

    let (metrics, reason) = system.core.run(u64::MAX);
    info!("terminated: {reason:?}");

    let crashed = match reason {
        TerminationReason::Breakpoint(comment) if comment == 0 => false,
        TerminationReason::Breakpoint(_) => true,
        TerminationReason::CycleBudgetExhausted | TerminationReason::Halted => true,
    };

    if crashed {
        let pc = system.core.registers.get_pc();
        let reason_name = match pc {
            0x00 => "Reset",
            0x04 => "Unidentified instruction",
            0x08 => "Software interrupt",
            0x0C => "Pre-fetch abort",
            0x10 => "Data abort",
            0x14 => "Address exception",
            0x18 => "Interrupt request",
            0x1C => "Fast interrupt request",
            _ => "Unknown",
        };
        println!("Program crashed: {reason_name}\nRegisters:");
        for i in (0..16).step_by(2) {
            println!(
                "\tR{i} = 0x{:08X}, R{} = 0x{:08X}",
                system.core.registers.get(i),
                i + 1,
                system.core.registers.get(i + 1)
            );
        }
        return Ok(false);
    }

    let seconds = metrics.elapsed.as_secs_f64();
    let loops_per_second = if seconds > 0.0 { (cycles as f64 / seconds).floor() } else { 0.0 };
    let mips = if seconds > 0.0 {
        metrics.cycles as f64 / seconds / 1.0e6
    } else {
        0.0
    };

    println!(
        "Executed {} CPU cycles in {seconds:.2} seconds (~{loops_per_second:.0} loops per second).\nSimulated performance: {mips:.2} MIPS",
        metrics.cycles
    );

    Ok(true)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(topic) = &args.help {
        if topic.is_empty() {
            print_help();
        } else if topic.eq_ignore_ascii_case("configs") {
            print_configs();
        } else {
            eprintln!("Unknown help topic '{topic}'.");
            std::process::exit(1);
        }
        return Ok(());
    }

    let config = args.config.unwrap_or(Configuration::ArmV2Test);
    let cycles = args.cycles.unwrap_or(DEFAULT_CYCLES);

    let ok = run(config, cycles)?;
    std::process::exit(if ok { 0 } else { 1 });
}
