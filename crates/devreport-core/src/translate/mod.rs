//! Integer fields to report labels.
//!
//! Bitmask translators name every set bit they know, highest bit first,
//! joined by single spaces, and return `None` when no named bit is set.
//! Enumerations map one exact value to one label.

pub mod ata;
pub mod scsi;

/// Bit names indexed by bit number; an empty name marks a bit without one.
pub type BitNames<const N: usize> = [&'static str; N];

pub(crate) fn flag_names<const N: usize>(value: u32, names: &BitNames<N>) -> Option<String> {
    let set: Vec<&str> = (0..N)
        .rev()
        .filter(|&bit| value & (1 << bit) != 0)
        .map(|bit| names[bit])
        .filter(|name| !name.is_empty())
        .collect();
    (!set.is_empty()).then(|| set.join(" "))
}

/// Mask of the bits `names` recognises.
#[cfg(test)]
pub(crate) fn known_bits<const N: usize>(names: &BitNames<N>) -> u32 {
    (0..N)
        .filter(|bit| !names[*bit].is_empty())
        .fold(0, |mask, bit| mask | 1 << bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: BitNames<4> = ["Zero", "", "Two", "Three"];

    #[test]
    fn highest_bit_first() {
        assert_eq!(flag_names(0b1101, &NAMES).as_deref(), Some("Three Two Zero"));
    }

    #[test]
    fn unnamed_bits_only() {
        assert_eq!(flag_names(0b0010, &NAMES), None);
        assert_eq!(flag_names(0, &NAMES), None);
    }

    #[test]
    fn bits_above_the_table_are_ignored() {
        assert_eq!(flag_names(0x10 | 0x1, &NAMES).as_deref(), Some("Zero"));
    }
}
