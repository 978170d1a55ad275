//! The benchmark payload itself.
//!
//! The original ties this driver to a full Dhrystone 2.1 port
//! (`DhrystoneProgram.hpp`/`.cpp`, not retrieved into this pack). Porting
//! Dhrystone itself is out of scope for this core's exercise; this is a
//! small counted ARM loop that exercises the same R0-seeded-cycle-count /
//! BKPT-terminated shape the driver expects, so the CLI's reporting and
//! TestBed wiring have something real to run. Noted as a scoping decision.

use arm_emu_asm::{assemble, AsmError};

use crate::testbed::RAM_BASE;

const SOURCE: &str = "\
loop:   SUBS R0, R0, #1\n\
        BNE loop\n\
        BKPT #0\n\
";

pub fn assemble_benchmark() -> Result<Vec<u32>, AsmError> {
    let assembled = assemble(SOURCE, RAM_BASE)?;
    Ok(assembled.words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_to_three_words() {
        let words = assemble_benchmark().unwrap();
        assert_eq!(words.len(), 3);
    }
}
