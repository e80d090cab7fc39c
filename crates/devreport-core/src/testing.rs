//! Headless stand-ins for the device and the operator.

use std::collections::VecDeque;

use devreport_scsi::{Completion, Direction, SenseBuffer, Transport};

use crate::console::Console;

/// What a scripted device answers to one CDB.
pub struct Reply {
    pub code: i32,
    pub sense: SenseBuffer,
    pub data: Vec<u8>,
}

impl Reply {
    pub fn data(bytes: &[u8]) -> Self {
        Self {
            code: 0,
            sense: [0u8; 32],
            data: bytes.to_vec(),
        }
    }

    pub fn ok() -> Self {
        Self::data(&[])
    }

    /// CHECK CONDITION with fixed format sense.
    pub fn check(key: u8, asc: u8, ascq: u8) -> Self {
        let mut sense = [0u8; 32];
        sense[0] = 0x70;
        sense[2] = key;
        sense[7] = 10;
        sense[12] = asc;
        sense[13] = ascq;
        Self {
            code: 2,
            sense,
            data: Vec::new(),
        }
    }

    /// Fixed sense with VALID and ILI set and `information` filled in.
    pub fn check_ili(key: u8, asc: u8, ascq: u8, information: u32) -> Self {
        let mut reply = Self::check(key, asc, ascq);
        reply.sense[0] |= 0x80;
        reply.sense[2] |= 0x20;
        reply.sense[3..7].copy_from_slice(&information.to_be_bytes());
        reply
    }

    pub fn failed(code: i32) -> Self {
        Self {
            code,
            sense: [0u8; 32],
            data: Vec::new(),
        }
    }
}

type Script = Box<dyn FnMut(&[u8], usize) -> Reply>;

/// Answers every CDB through a closure and keeps a log of what was sent.
pub struct ScriptedTransport {
    script: Script,
    pub sent: Vec<Vec<u8>>,
}

impl ScriptedTransport {
    pub fn new(script: impl FnMut(&[u8], usize) -> Reply + 'static) -> Self {
        Self {
            script: Box::new(script),
            sent: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, cdb: &[u8], buffer: &mut [u8], _direction: Direction) -> Completion {
        self.sent.push(cdb.to_vec());
        let reply = (self.script)(cdb, buffer.len());
        let len = reply.data.len().min(buffer.len());
        buffer[..len].copy_from_slice(&reply.data[..len]);
        Completion::failed(reply.code, reply.sense)
    }
}

/// Pops canned answers; says no and types nothing once they run out.
#[derive(Default)]
pub struct ScriptedConsole {
    pub answers: VecDeque<bool>,
    pub lines: VecDeque<String>,
    pub questions: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(answers: &[bool], lines: &[&str]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            lines: lines.iter().map(|line| line.to_string()).collect(),
            questions: Vec::new(),
        }
    }
}

impl Console for ScriptedConsole {
    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn prompt_line(&mut self, question: &str) -> String {
        self.questions.push(question.to_string());
        self.lines.pop_front().unwrap_or_default()
    }

    fn wait_for_enter(&mut self, _message: &str) {}
}

/// IDENTIFY data with a model and firmware string and nothing else.
pub fn identify_image(model: &str, firmware: &str) -> Vec<u8> {
    let mut buf = vec![0u8; 512];
    put_ata_string(&mut buf, 23, 26, firmware);
    put_ata_string(&mut buf, 27, 46, model);
    buf
}

pub fn put_word(buf: &mut [u8], index: usize, value: u16) {
    buf[index * 2..index * 2 + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_ata_string(buf: &mut [u8], first: usize, last: usize, text: &str) {
    let field = &mut buf[first * 2..(last + 1) * 2];
    field.fill(b' ');
    field[..text.len()].copy_from_slice(text.as_bytes());
    for pair in field.chunks_mut(2) {
        pair.swap(0, 1);
    }
}

/// Standard 36 byte INQUIRY data.
pub fn inquiry_data(device_type: u8, vendor: &str, product: &str, revision: &str) -> Vec<u8> {
    let mut buf = vec![b' '; 36];
    buf[0] = device_type;
    buf[1] = 0;
    buf[2] = 0x05;
    buf[3] = 0x02;
    buf[4] = 31;
    buf[5] = 0;
    buf[6] = 0;
    buf[7] = 0;
    buf[8..8 + vendor.len()].copy_from_slice(vendor.as_bytes());
    buf[16..16 + product.len()].copy_from_slice(product.as_bytes());
    buf[32..32 + revision.len()].copy_from_slice(revision.as_bytes());
    buf
}
