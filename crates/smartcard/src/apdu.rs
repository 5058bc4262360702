//! ISO/IEC 7816-4 command and response APDUs (short length encoding).

use std::fmt;

use crate::error::{SmartcardError, SmartcardResult};

/// Largest command data field in short encoding.
pub const MAX_SHORT_DATA: usize = 255;

/// Status word reported on success.
pub const SW_SUCCESS: u16 = 0x9000;

/// A command APDU as sent to a card.
pub trait Apdu {
    /// CLA, INS, P1, P2
    fn header(&self) -> [u8; 4];

    fn data(&self) -> &[u8];

    /// Expected response length; `Some(0)` requests up to 256 bytes.
    fn le(&self) -> Option<u8>;

    fn set_le(&mut self, le: u8) -> SmartcardResult<()>;

    /// Wire encoding: header, then `Lc || data` when data is present, then `Le`
    /// when set.
    fn to_bytes(&self) -> SmartcardResult<Vec<u8>> {
        let data = self.data();
        if data.len() > MAX_SHORT_DATA {
            return Err(SmartcardError::ApduTooLong { length: data.len() });
        }

        let mut out = Vec::with_capacity(4 + 1 + data.len() + 1);
        out.extend_from_slice(&self.header());
        if !data.is_empty() {
            out.push(data.len() as u8);
            out.extend_from_slice(data);
        }
        if let Some(le) = self.le() {
            out.push(le);
        }
        Ok(out)
    }
}

/// Plain command APDU.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandApdu {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    le: Option<u8>,
}

impl CommandApdu {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: impl Into<Vec<u8>>, le: Option<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: data.into(),
            le,
        }
    }

    /// Decode a short-length command APDU.
    ///
    /// A single trailing byte after the header is read as `Le`.
    pub fn from_bytes(raw: &[u8]) -> SmartcardResult<Self> {
        let (header, body) = match raw {
            [cla, ins, p1, p2, body @ ..] => ([*cla, *ins, *p1, *p2], body),
            _ => {
                return Err(SmartcardError::MalformedResponse(format!(
                    "command APDU shorter than header: {} bytes",
                    raw.len()
                )))
            }
        };
        let [cla, ins, p1, p2] = header;

        let (data, le) = match body {
            [] => (Vec::new(), None),
            [le] => (Vec::new(), Some(*le)),
            [lc, rest @ ..] => {
                let lc = usize::from(*lc);
                match rest.len().checked_sub(lc) {
                    Some(0) => (rest.to_vec(), None),
                    Some(1) => (rest[..lc].to_vec(), Some(rest[lc])),
                    _ => {
                        return Err(SmartcardError::MalformedResponse(format!(
                            "Lc {} does not match body length {}",
                            lc,
                            rest.len()
                        )))
                    }
                }
            }
        };

        Ok(Self::new(cla, ins, p1, p2, data, le))
    }

    pub fn cla(&self) -> u8 {
        self.cla
    }

    pub fn ins(&self) -> u8 {
        self.ins
    }

    pub fn p1(&self) -> u8 {
        self.p1
    }

    pub fn p2(&self) -> u8 {
        self.p2
    }
}

impl Apdu for CommandApdu {
    fn header(&self) -> [u8; 4] {
        [self.cla, self.ins, self.p1, self.p2]
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn le(&self) -> Option<u8> {
        self.le
    }

    fn set_le(&mut self, le: u8) -> SmartcardResult<()> {
        self.le = Some(le);
        Ok(())
    }
}

impl fmt::Debug for CommandApdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandApdu")
            .field("header", &hex::encode(self.header()))
            .field("data_len", &self.data.len())
            .field("le", &self.le)
            .finish()
    }
}

/// Response APDU: data followed by the two status bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    data: Vec<u8>,
    status_word: u16,
}

impl ResponseApdu {
    pub fn new(data: impl Into<Vec<u8>>, status_word: u16) -> Self {
        Self {
            data: data.into(),
            status_word,
        }
    }

    pub fn from_bytes(raw: &[u8]) -> SmartcardResult<Self> {
        match raw {
            [data @ .., sw1, sw2] => Ok(Self::new(data, u16::from_be_bytes([*sw1, *sw2]))),
            _ => Err(SmartcardError::MalformedResponse(format!(
                "response shorter than status word: {} bytes",
                raw.len()
            ))),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn status_word(&self) -> u16 {
        self.status_word
    }

    pub fn is_success(&self) -> bool {
        self.status_word == SW_SUCCESS
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        out.extend_from_slice(&self.status_word.to_be_bytes());
        out
    }
}
