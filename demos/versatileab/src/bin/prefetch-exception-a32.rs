//! Example triggering a prefetch exception.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};
use cortex_ar::register::{Ifar, Ifsr};
use semihosting::println;

// pull in our start-up code
use versatileab::rt::{entry, exception};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// The entry-point to the Rust application.
///
/// It is called by the start-up.
#[entry]
fn main() -> ! {
    println!("Hello, this is a prefetch exception example");

    // A BKPT instruction triggers a Prefetch Abort except when Halting debug-mode is enabled.
    // See p. 2038 of ARMv7-M Architecture Reference Manual
    unsafe {
        // trigger an prefetch exception, from A32 (Arm) mode
        bkpt_from_a32();
    }

    println!("Recovered from fault OK!");

    semihosting::process::exit(0);
}

// These functions are written in assembly
extern "C" {
    fn bkpt_from_a32();
}

core::arch::global_asm!(
    r#"
    // fn bkpt_from_a32();
    .arm
    .global bkpt_from_a32
    .type bkpt_from_a32, %function
    bkpt_from_a32:
        bkpt    #0
        bx      lr
    .size bkpt_from_a32, . - bkpt_from_a32
"#
);

#[exception(UndefinedHandler)]
fn undefined_handler(_addr: usize) -> ! {
    panic!("unexpected undefined exception");
}

#[exception(PrefetchHandler)]
fn prefetch_handler(addr: usize) -> usize {
    println!("prefetch abort occurred");
    let ifsr = Ifsr::read();
    println!("IFSR (Fault Status Register): {:?}", ifsr);
    println!("IFSR Status: {:?}", ifsr.status());
    let ifar = Ifar::read();
    println!("IFAR (Faulting Address Register): {:?}", ifar);

    if addr == bkpt_from_a32 as usize {
        println!("caught bkpt_from_a32");
    } else {
        println!(
            "Bad fault address {:08x} is not {:08x}",
            addr, bkpt_from_a32 as usize
        );
    }

    match COUNTER.fetch_add(1, Ordering::Relaxed) {
        0 => {
            // first time, huh?
            // go back and do it again
            println!("Doing it again");
            addr
        }
        1 => {
            // second time, huh?
            // go back but skip the instruction
            println!("Skipping instruction");
            addr + 4
        }
        _ => {
            // we've faulted thrice - time to quit
            panic!("_prefetch_handler called too often");
        }
    }
}

#[exception(AbortHandler)]
fn abort_handler(_addr: usize) -> ! {
    panic!("unexpected abort exception");
}
