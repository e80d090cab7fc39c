use crate::commands::{CommandBlock, put_be};

/// Page control field of MODE SENSE, byte 2 bits 7..6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Current = 0,
    Changeable = 1,
    Default = 2,
    Saved = 3,
}

/// Request every page.
pub const ALL_PAGES: u8 = 0x3F;
/// Request every subpage of the selected pages.
pub const ALL_SUBPAGES: u8 = 0xFF;

/// MODE SENSE (6).
#[derive(Debug, Clone, Copy)]
pub struct ModeSense6Command {
    /// Disable block descriptors.
    pub dbd: bool,
    pub page_control: PageControl,
    pub page_code: u8,
    pub subpage_code: u8,
    pub alloc_len: u8,
}

impl ModeSense6Command {
    pub fn new(page_code: u8, subpage_code: u8, alloc_len: u8) -> Self {
        Self {
            dbd: false,
            page_control: PageControl::Current,
            page_code,
            subpage_code,
            alloc_len,
        }
    }
}

impl CommandBlock for ModeSense6Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x1A;
        if self.dbd {
            cdb[1] = 0x08;
        }
        cdb[2] = ((self.page_control as u8) << 6) | (self.page_code & 0x3F);
        cdb[3] = self.subpage_code;
        cdb[4] = self.alloc_len;
        cdb
    }

    fn len(&self) -> u8 {
        6
    }
}

/// MODE SENSE (10).
#[derive(Debug, Clone, Copy)]
pub struct ModeSense10Command {
    /// Long LBA accepted: allow 16-byte block descriptors.
    pub llbaa: bool,
    /// Disable block descriptors.
    pub dbd: bool,
    pub page_control: PageControl,
    pub page_code: u8,
    pub subpage_code: u8,
    pub alloc_len: u16,
}

impl ModeSense10Command {
    pub fn new(page_code: u8, subpage_code: u8, alloc_len: u16) -> Self {
        Self {
            llbaa: false,
            dbd: false,
            page_control: PageControl::Current,
            page_code,
            subpage_code,
            alloc_len,
        }
    }
}

impl CommandBlock for ModeSense10Command {
    fn to_bytes(&self) -> [u8; 16] {
        let mut cdb = [0u8; 16];
        cdb[0] = 0x5A;
        if self.llbaa {
            cdb[1] |= 0x10;
        }
        if self.dbd {
            cdb[1] |= 0x08;
        }
        cdb[2] = ((self.page_control as u8) << 6) | (self.page_code & 0x3F);
        cdb[3] = self.subpage_code;
        put_be(&mut cdb, 7, 2, self.alloc_len as u64);
        cdb
    }

    fn len(&self) -> u8 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_sense6_all_pages() {
        let mut cmd = ModeSense6Command::new(ALL_PAGES, ALL_SUBPAGES, 255);
        cmd.page_control = PageControl::Default;
        let cdb = cmd.to_bytes();
        assert_eq!(&cdb[..6], &[0x1A, 0x00, 0xBF, 0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn mode_sense10_flags() {
        let mut cmd = ModeSense10Command::new(0x2A, 0, 0x1000);
        cmd.dbd = true;
        cmd.llbaa = true;
        let cdb = cmd.to_bytes();
        assert_eq!(&cdb[..10], &[0x5A, 0x18, 0x2A, 0x00, 0, 0, 0, 0x10, 0x00, 0]);
    }
}
