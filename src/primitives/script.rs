//! Script construction and parsing.
//!
//! Only the templates the confidential transaction core needs are covered:
//! standard output templates, push encoding, script numbers, multisig
//! parsing and code separator removal. There is no interpreter.

use super::encode::{read_varbytes, write_varbytes, Decodable, Encodable};
use super::hash::{hash160, sha256, Hash160, Hash256};
use crate::{CtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Script opcodes used by the templates in this crate.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    OP_0,
    OP_PUSHDATA1,
    OP_PUSHDATA2,
    OP_PUSHDATA4,
    OP_1NEGATE,
    /// OP_1 through OP_16
    OP_N(u8),
    OP_RETURN,
    OP_DUP,
    OP_EQUAL,
    OP_EQUALVERIFY,
    OP_HASH160,
    OP_CODESEPARATOR,
    OP_CHECKSIG,
    OP_CHECKMULTISIG,
    OP_CHECKMULTISIGVERIFY,
    Other(u8),
}

impl Opcode {
    pub fn to_u8(self) -> u8 {
        match self {
            Opcode::OP_0 => 0x00,
            Opcode::OP_PUSHDATA1 => 0x4c,
            Opcode::OP_PUSHDATA2 => 0x4d,
            Opcode::OP_PUSHDATA4 => 0x4e,
            Opcode::OP_1NEGATE => 0x4f,
            Opcode::OP_N(n) => 0x50 + n,
            Opcode::OP_RETURN => 0x6a,
            Opcode::OP_DUP => 0x76,
            Opcode::OP_EQUAL => 0x87,
            Opcode::OP_EQUALVERIFY => 0x88,
            Opcode::OP_HASH160 => 0xa9,
            Opcode::OP_CODESEPARATOR => 0xab,
            Opcode::OP_CHECKSIG => 0xac,
            Opcode::OP_CHECKMULTISIG => 0xae,
            Opcode::OP_CHECKMULTISIGVERIFY => 0xaf,
            Opcode::Other(b) => b,
        }
    }
}

impl From<u8> for Opcode {
    fn from(b: u8) -> Self {
        match b {
            0x00 => Opcode::OP_0,
            0x4c => Opcode::OP_PUSHDATA1,
            0x4d => Opcode::OP_PUSHDATA2,
            0x4e => Opcode::OP_PUSHDATA4,
            0x4f => Opcode::OP_1NEGATE,
            0x51..=0x60 => Opcode::OP_N(b - 0x50),
            0x6a => Opcode::OP_RETURN,
            0x76 => Opcode::OP_DUP,
            0x87 => Opcode::OP_EQUAL,
            0x88 => Opcode::OP_EQUALVERIFY,
            0xa9 => Opcode::OP_HASH160,
            0xab => Opcode::OP_CODESEPARATOR,
            0xac => Opcode::OP_CHECKSIG,
            0xae => Opcode::OP_CHECKMULTISIG,
            0xaf => Opcode::OP_CHECKMULTISIGVERIFY,
            other => Opcode::Other(other),
        }
    }
}

/// Script instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Push data onto the stack
    PushBytes(Vec<u8>),
    /// Execute an opcode
    Op(Opcode),
}

/// Bitcoin/Elements script
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(pub Vec<u8>);

impl Script {
    /// Create a new empty script
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    /// Get the script bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the instruction starting at `pos`, returning it with the
    /// position of the next one.
    fn read_instruction(&self, pos: usize) -> Result<(Instruction, usize)> {
        let bytes = &self.0;
        let opcode = bytes[pos];
        let mut i = pos + 1;

        let len = match opcode {
            0x01..=0x4b => opcode as usize,
            0x4c => {
                let b = *bytes.get(i).ok_or_else(truncated)?;
                i += 1;
                b as usize
            }
            0x4d => {
                let b = bytes.get(i..i + 2).ok_or_else(truncated)?;
                i += 2;
                u16::from_le_bytes([b[0], b[1]]) as usize
            }
            0x4e => {
                let b = bytes.get(i..i + 4).ok_or_else(truncated)?;
                i += 4;
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
            }
            _ => return Ok((Instruction::Op(Opcode::from(opcode)), i)),
        };

        let data = bytes.get(i..i + len).ok_or_else(truncated)?;
        Ok((Instruction::PushBytes(data.to_vec()), i + len))
    }

    /// Parse the script into instructions
    pub fn instructions(&self) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();
        let mut pos = 0;
        while pos < self.0.len() {
            let (instruction, next) = self.read_instruction(pos)?;
            instructions.push(instruction);
            pos = next;
        }
        Ok(instructions)
    }

    /// Copy of this script with every OP_CODESEPARATOR removed, as required
    /// by the legacy signature hash.
    pub fn without_codeseparators(&self) -> Result<Script> {
        let mut out = Vec::with_capacity(self.0.len());
        let mut pos = 0;
        while pos < self.0.len() {
            let (instruction, next) = self.read_instruction(pos)?;
            if instruction != Instruction::Op(Opcode::OP_CODESEPARATOR) {
                out.extend_from_slice(&self.0[pos..next]);
            }
            pos = next;
        }
        Ok(Script(out))
    }

    /// Check if this is a P2PKH script pattern
    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == 25 &&
        self.0[0] == 0x76 && // OP_DUP
        self.0[1] == 0xa9 && // OP_HASH160
        self.0[2] == 0x14 && // Push 20 bytes
        self.0[23] == 0x88 && // OP_EQUALVERIFY
        self.0[24] == 0xac    // OP_CHECKSIG
    }

    /// Check if this is a P2SH script pattern
    pub fn is_p2sh(&self) -> bool {
        self.0.len() == 23 &&
        self.0[0] == 0xa9 && // OP_HASH160
        self.0[1] == 0x14 && // Push 20 bytes
        self.0[22] == 0x87   // OP_EQUAL
    }

    /// Check if this is a P2WPKH script pattern
    pub fn is_p2wpkh(&self) -> bool {
        self.0.len() == 22 &&
        self.0[0] == 0x00 && // OP_0
        self.0[1] == 0x14    // Push 20 bytes
    }

    /// Check if this is a P2WSH script pattern
    pub fn is_p2wsh(&self) -> bool {
        self.0.len() == 34 &&
        self.0[0] == 0x00 && // OP_0
        self.0[1] == 0x20    // Push 32 bytes
    }

    /// Check if this is an OP_RETURN script
    pub fn is_op_return(&self) -> bool {
        !self.0.is_empty() && self.0[0] == 0x6a
    }

    /// Create a P2PKH script for the given hash160
    pub fn new_p2pkh(hash160: &Hash160) -> Self {
        let mut script = Vec::with_capacity(25);
        script.push(0x76); // OP_DUP
        script.push(0xa9); // OP_HASH160
        script.push(0x14); // Push 20 bytes
        script.extend_from_slice(hash160);
        script.push(0x88); // OP_EQUALVERIFY
        script.push(0xac); // OP_CHECKSIG
        Script(script)
    }

    /// Create a P2SH script for the given hash160
    pub fn new_p2sh(hash160: &Hash160) -> Self {
        let mut script = Vec::with_capacity(23);
        script.push(0xa9); // OP_HASH160
        script.push(0x14); // Push 20 bytes
        script.extend_from_slice(hash160);
        script.push(0x87); // OP_EQUAL
        Script(script)
    }

    /// Create a P2WPKH script for the given hash160
    pub fn new_p2wpkh(hash160: &Hash160) -> Self {
        let mut script = Vec::with_capacity(22);
        script.push(0x00); // OP_0
        script.push(0x14); // Push 20 bytes
        script.extend_from_slice(hash160);
        Script(script)
    }

    /// Create a P2WSH script for the given hash256
    pub fn new_p2wsh(hash256: &Hash256) -> Self {
        let mut script = Vec::with_capacity(34);
        script.push(0x00); // OP_0
        script.push(0x20); // Push 32 bytes
        script.extend_from_slice(hash256);
        Script(script)
    }

    /// The provably unspendable single-opcode script used for burn outputs.
    pub fn new_op_return() -> Self {
        Script(vec![0x6a])
    }

    /// P2SH script committing to this script as redeem script.
    pub fn to_p2sh(&self) -> Script {
        Script::new_p2sh(&hash160(&self.0))
    }

    /// P2WSH script committing to this script as witness script.
    pub fn to_p2wsh(&self) -> Script {
        Script::new_p2wsh(&sha256(&self.0))
    }

    /// Parses `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`, returning the
    /// required signature count and the public keys in script order.
    pub fn multisig_pubkeys(&self) -> Result<(usize, Vec<Vec<u8>>)> {
        let instructions = self.instructions()?;
        let not_multisig = || CtError::IllegalArgument("script is not a multisig script".to_string());

        let (first, rest) = instructions.split_first().ok_or_else(not_multisig)?;
        let required = match first {
            Instruction::Op(Opcode::OP_N(m)) => *m as usize,
            _ => return Err(not_multisig()),
        };

        let mut pubkeys = Vec::new();
        let mut iter = rest.iter();
        let total = loop {
            match iter.next() {
                Some(Instruction::PushBytes(data)) if data.len() == 33 || data.len() == 65 => {
                    pubkeys.push(data.clone())
                }
                Some(Instruction::Op(Opcode::OP_N(n))) => break *n as usize,
                _ => return Err(not_multisig()),
            }
        };

        match iter.next() {
            Some(Instruction::Op(Opcode::OP_CHECKMULTISIG))
            | Some(Instruction::Op(Opcode::OP_CHECKMULTISIGVERIFY)) => {}
            _ => return Err(not_multisig()),
        }
        if iter.next().is_some() || total != pubkeys.len() || required == 0 || required > total {
            return Err(not_multisig());
        }
        Ok((required, pubkeys))
    }
}

fn truncated() -> CtError {
    CtError::Format("script truncated".to_string())
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl FromStr for Script {
    type Err = CtError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Script(hex::decode(s)?))
    }
}

impl Encodable for Script {
    fn consensus_encode<W: Write>(&self, writer: &mut W) -> Result<usize> {
        write_varbytes(writer, &self.0)
    }
}

impl Decodable for Script {
    fn consensus_decode<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Script(read_varbytes(reader)?))
    }
}

/// Incremental script construction with minimal push encoding.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    pub fn new() -> Self {
        ScriptBuilder(Vec::new())
    }

    pub fn push_opcode(mut self, opcode: Opcode) -> Self {
        self.0.push(opcode.to_u8());
        self
    }

    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < 0x4c {
            self.0.push(len as u8);
        } else if len <= 0xff {
            self.0.push(0x4c);
            self.0.push(len as u8);
        } else if len <= 0xffff {
            self.0.push(0x4d);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(0x4e);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
        self
    }

    /// Pushes an integer as OP_0/OP_1NEGATE/OP_1..OP_16 or as a minimal
    /// script number.
    pub fn push_int(self, n: i64) -> Self {
        match n {
            0 => self.push_opcode(Opcode::OP_0),
            -1 => self.push_opcode(Opcode::OP_1NEGATE),
            1..=16 => self.push_opcode(Opcode::OP_N(n as u8)),
            _ => {
                let encoded = script_num_encode(n);
                self.push_slice(&encoded)
            }
        }
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}

/// Minimal little-endian sign-magnitude encoding of a script number.
pub fn script_num_encode(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut out = Vec::new();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    if out[out.len() - 1] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = out.len() - 1;
        out[last] |= 0x80;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parsing() {
        let script: Script = "76a914000102030405060708090a0b0c0d0e0f1011121388ac".parse().unwrap();
        let instructions = script.instructions().unwrap();
        assert_eq!(instructions.len(), 5);
        assert_eq!(instructions[0], Instruction::Op(Opcode::OP_DUP));
        assert!(matches!(&instructions[2], Instruction::PushBytes(d) if d.len() == 20));
        assert!(script.is_p2pkh());
    }

    #[test]
    fn test_truncated_push() {
        let script = Script(vec![0x05, 0x01]);
        assert!(matches!(script.instructions(), Err(CtError::Format(_))));
    }

    #[test]
    fn test_script_patterns() {
        let hash = [0x12u8; 20];
        assert!(Script::new_p2pkh(&hash).is_p2pkh());
        assert!(Script::new_p2sh(&hash).is_p2sh());
        assert!(Script::new_p2wpkh(&hash).is_p2wpkh());
        assert!(Script::new_p2wsh(&[0x34u8; 32]).is_p2wsh());
        assert!(Script::new_op_return().is_op_return());
        assert_eq!(Script::new_op_return().to_string(), "6a");
    }

    #[test]
    fn test_push_int() {
        assert_eq!(ScriptBuilder::new().push_int(0).into_script().0, vec![0x00]);
        assert_eq!(ScriptBuilder::new().push_int(16).into_script().0, vec![0x60]);
        assert_eq!(ScriptBuilder::new().push_int(17).into_script().0, vec![0x01, 0x11]);
        assert_eq!(ScriptBuilder::new().push_int(128).into_script().0, vec![0x02, 0x80, 0x00]);
        assert_eq!(ScriptBuilder::new().push_int(-5).into_script().0, vec![0x01, 0x85]);
        assert_eq!(ScriptBuilder::new().push_int(256).into_script().0, vec![0x02, 0x00, 0x01]);
    }

    #[test]
    fn test_push_slice_uses_pushdata1() {
        let data = vec![0xaa; 80];
        let script = ScriptBuilder::new().push_slice(&data).into_script();
        assert_eq!(&script.0[..2], &[0x4c, 80]);
        assert_eq!(script.instructions().unwrap(), vec![Instruction::PushBytes(data)]);
    }

    #[test]
    fn test_multisig_pubkeys() {
        let pk1 = [0x02u8; 33];
        let pk2 = [0x03u8; 33];
        let script = ScriptBuilder::new()
            .push_int(1)
            .push_slice(&pk1)
            .push_slice(&pk2)
            .push_int(2)
            .push_opcode(Opcode::OP_CHECKMULTISIG)
            .into_script();
        let (required, pubkeys) = script.multisig_pubkeys().unwrap();
        assert_eq!(required, 1);
        assert_eq!(pubkeys, vec![pk1.to_vec(), pk2.to_vec()]);

        let not_multisig = Script::new_p2pkh(&[0u8; 20]);
        assert!(matches!(not_multisig.multisig_pubkeys(), Err(CtError::IllegalArgument(_))));
    }

    #[test]
    fn test_codeseparator_removal_skips_push_data() {
        // OP_CODESEPARATOR, push(0xab), OP_CHECKSIG
        let script = Script(vec![0xab, 0x01, 0xab, 0xac]);
        assert_eq!(script.without_codeseparators().unwrap().0, vec![0x01, 0xab, 0xac]);
    }

    #[test]
    fn test_script_encode_decode() {
        let script = Script::new_p2wpkh(&[7u8; 20]);
        let encoded = script.consensus_encode_to_vec().unwrap();
        assert_eq!(encoded[0], 22);
        assert_eq!(Script::consensus_decode_from_slice(&encoded).unwrap(), script);
    }
}
