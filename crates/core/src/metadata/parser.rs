//! Tokenizer for the meta-data instruction stream.
//!
//! Grammar: `Start Program Meta-Data Code:` header, whitespace-separated tokens of the
//! form `<C>{<descriptor>}<cycles><;|.>`, `End Program Meta-Data Code.` trailer. The
//! last token's terminator is `.`; every other token's is `;`.

use crate::common::error::MetaDataError;
use crate::config::Config;
use crate::metadata::instruction::Instruction;

const HEADER: &str = "Start Program Meta-Data Code:";
const TRAILER: &str = "End Program Meta-Data Code.";

/// The longest descriptor in the vocabulary (`hard drive`) is 10 characters; the scan
/// for a closing brace gives up two characters past that rather than running to the
/// end of the stream, matching the original implementation's bounds check.
const MAX_DESCRIPTOR_SCAN: usize = 12;

fn descriptor_vocabulary(code: char) -> &'static [&'static str] {
    match code {
        'S' | 'A' => &["begin", "finish"],
        'P' => &["run"],
        'M' => &["block", "allocate"],
        'I' => &["hard drive", "keyboard", "scanner"],
        'O' => &["hard drive", "monitor", "projector"],
        _ => &[],
    }
}

/// Parses a full meta-data stream into an ordered instruction list.
///
/// # Errors
///
/// Returns [`MetaDataError`] on the first malformed token; no partial result is
/// returned on failure.
pub fn parse(text: &str, config: &Config) -> Result<Vec<Instruction>, MetaDataError> {
    let text = text.trim();
    let after_header = text.strip_prefix(HEADER).ok_or(MetaDataError::UnexpectedHeader)?;
    let body = after_header
        .trim_end()
        .strip_suffix(TRAILER)
        .ok_or(MetaDataError::UnexpectedTrailer)?;

    let chars: Vec<char> = body.chars().collect();
    let mut i = 0usize;
    let mut instructions = Vec::new();
    let mut saw_final_terminator = false;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        if saw_final_terminator {
            // A token appeared after the instruction that used the final `.` terminator.
            return Err(MetaDataError::UnexpectedTrailer);
        }

        let code = chars[i];
        if !matches!(code, 'S' | 'A' | 'P' | 'M' | 'I' | 'O') {
            return Err(MetaDataError::UnknownCode(code));
        }
        i += 1;

        if chars.get(i) != Some(&'{') {
            return Err(MetaDataError::UnknownDescriptor {
                code,
                descriptor: String::new(),
            });
        }
        i += 1;

        let mut descriptor = String::new();
        loop {
            match chars.get(i) {
                Some('}') => break,
                Some(c) => {
                    descriptor.push(*c);
                    i += 1;
                    if descriptor.len() > MAX_DESCRIPTOR_SCAN {
                        return Err(MetaDataError::UnknownDescriptor { code, descriptor });
                    }
                }
                None => {
                    return Err(MetaDataError::UnknownDescriptor { code, descriptor });
                }
            }
        }
        i += 1; // consume '}'

        if !descriptor_vocabulary(code).contains(&descriptor.as_str()) {
            return Err(MetaDataError::UnknownDescriptor { code, descriptor });
        }

        let cycles_start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        let cycles_text: String = chars[cycles_start..i].iter().collect();
        if cycles_text.is_empty() {
            return Err(MetaDataError::CyclesOutOfRange(cycles_text));
        }
        let cycles: u32 = cycles_text
            .parse()
            .map_err(|_| MetaDataError::CyclesOutOfRange(cycles_text.clone()))?;
        if cycles > 99 {
            return Err(MetaDataError::CyclesOutOfRange(cycles_text));
        }
        let cycles = cycles as u8;

        let terminator = chars.get(i).copied();
        match terminator {
            Some(';') => i += 1,
            Some('.') => {
                i += 1;
                saw_final_terminator = true;
            }
            _ => {
                return Err(MetaDataError::MissingTerminator(format!(
                    "{code}{{{descriptor}}}{cycles}"
                )));
            }
        }

        let total_ms = u32::from(cycles) * config.device_time_for(code, &descriptor);
        instructions.push(Instruction {
            code,
            descriptor,
            cycles,
            total_ms,
        });
    }

    if !saw_final_terminator {
        return Err(MetaDataError::UnexpectedTrailer);
    }

    Ok(instructions)
}
