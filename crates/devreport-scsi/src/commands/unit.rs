//! Unit-level commands without a data phase: TEST UNIT READY, START STOP
//! UNIT, PREVENT ALLOW MEDIUM REMOVAL, LOAD UNLOAD and SEEK.

use crate::commands::{CommandBlock, Direction, put_be};

/// TEST UNIT READY.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestUnitReadyCommand;

impl CommandBlock for TestUnitReadyCommand {
    fn to_bytes(&self) -> [u8; 16] {
        [0u8; 16]
    }

    fn len(&self) -> u8 {
        6
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

/// START STOP UNIT.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartStopUnitCommand {
    pub immediate: bool,
    pub format_layer: u8,
    pub power_conditions: u8,
    pub change_format_layer: bool,
    pub load_eject: bool,
    pub start: bool,
}

impl StartStopUnitCommand {
    /// Stop the unit and eject the medium.
    pub fn eject() -> Self {
        Self {
            load_eject: true,
            ..Self::default()
        }
    }

    /// Load the medium and start the unit.
    pub fn load() -> Self {
        Self {
            load_eject: true,
            start: true,
            ..Self::default()
        }
    }
}

impl CommandBlock for StartStopUnitCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x1B;
        if self.immediate {
            cdb[1] = 0x01;
        }
        cdb[3] = self.format_layer & 0x03;
        cdb[4] = (self.power_conditions & 0x0F) << 4;
        if self.change_format_layer {
            cdb[4] |= 0x04;
        }
        if self.load_eject {
            cdb[4] |= 0x02;
        }
        if self.start {
            cdb[4] |= 0x01;
        }
        cdb
    }

    fn len(&self) -> u8 {
        6
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

/// PREVENT ALLOW MEDIUM REMOVAL.
#[derive(Debug, Clone, Copy)]
pub struct PreventAllowMediumRemovalCommand {
    pub prevent: bool,
    pub persistent: bool,
}

impl PreventAllowMediumRemovalCommand {
    pub fn allow() -> Self {
        Self {
            prevent: false,
            persistent: false,
        }
    }
}

impl CommandBlock for PreventAllowMediumRemovalCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x1E;
        if self.prevent {
            cdb[4] |= 0x01;
        }
        if self.persistent {
            cdb[4] |= 0x02;
        }
        cdb
    }

    fn len(&self) -> u8 {
        6
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

/// LOAD UNLOAD (SSC). Shares the opcode of START STOP UNIT.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadUnloadCommand {
    pub immediate: bool,
    pub hold: bool,
    pub end_of_tape: bool,
    pub retension: bool,
    pub load: bool,
}

impl LoadUnloadCommand {
    pub fn unload() -> Self {
        Self::default()
    }
}

impl CommandBlock for LoadUnloadCommand {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x1B;
        if self.immediate {
            cdb[1] = 0x01;
        }
        if self.hold {
            cdb[4] |= 0x08;
        }
        if self.end_of_tape {
            cdb[4] |= 0x04;
        }
        if self.retension {
            cdb[4] |= 0x02;
        }
        if self.load {
            cdb[4] |= 0x01;
        }
        cdb
    }

    fn len(&self) -> u8 {
        6
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

/// SEEK (6), 21-bit LBA.
#[derive(Debug, Clone, Copy)]
pub struct Seek6Command {
    pub logical_block_address: u32,
}

impl CommandBlock for Seek6Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x0B;
        cdb[1] = ((self.logical_block_address >> 16) & 0x1F) as u8;
        cdb[2] = (self.logical_block_address >> 8) as u8;
        cdb[3] = self.logical_block_address as u8;
        cdb
    }

    fn len(&self) -> u8 {
        6
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

/// SEEK (10).
#[derive(Debug, Clone, Copy)]
pub struct Seek10Command {
    pub logical_block_address: u32,
}

impl CommandBlock for Seek10Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x2B;
        put_be(&mut cdb, 2, 4, self.logical_block_address as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }

    fn direction(&self) -> Direction {
        Direction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eject_sets_load_eject_only() {
        let cdb = StartStopUnitCommand::eject().to_bytes();
        assert_eq!(&cdb[..6], &[0x1B, 0, 0, 0, 0x02, 0]);
        let cdb = StartStopUnitCommand::load().to_bytes();
        assert_eq!(cdb[4], 0x03);
    }

    #[test]
    fn prevent_allow() {
        assert_eq!(PreventAllowMediumRemovalCommand::allow().to_bytes()[4], 0);
        let cmd = PreventAllowMediumRemovalCommand {
            prevent: true,
            persistent: false,
        };
        assert_eq!(cmd.to_bytes()[4], 1);
    }

    #[test]
    fn seek_commands() {
        let cdb = Seek6Command {
            logical_block_address: 0x2A_BCDE,
        }
        .to_bytes();
        assert_eq!(&cdb[..4], &[0x0B, 0x0A, 0xBC, 0xDE]);
        let cdb = Seek10Command {
            logical_block_address: 0xDEAD_BEEF,
        }
        .to_bytes();
        assert_eq!(&cdb[..6], &[0x2B, 0, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn no_data_phase() {
        assert_eq!(TestUnitReadyCommand.direction(), Direction::None);
        assert_eq!(LoadUnloadCommand::unload().direction(), Direction::None);
    }
}
