//! # Certificate — Proof-Text Assembler (C9)
//!
//! Builds and parses the line-oriented ECPP proof-certificate format from
//! §6: one text line per recursion level, outermost first —
//!
//! ```text
//! <N_i> : ECPP : <a> <b> <m> <q> (<Px>:<Py>)
//! ```
//!
//! all numbers base 10, no leading zeros, no internal whitespace inside a
//! number. [`assemble`] concatenates [`Frame`](crate::ecpp::Frame) values as
//! `ecpp::prove` unwinds; [`parse`] and [`verify`] perform the independent
//! per-line re-check a verifier runs: `m = N+1-t` within the Hasse bound,
//! `q | m`, `q > (N^{1/4}+1)²`, the point lies on the curve, `m·P = 𝒪`,
//! `q·P ≠ 𝒪`, and finally that `N_{i+1}` is the subject of the next line (or
//! small enough for BPSW).

use crate::bpsw::{is_prob_prime, BpswResult};
use crate::curve::{ecpp_check_point, Curve, Point, PointCheck};
use crate::ecpp::Frame;
use crate::error::{EResult, EcppError};
use rug::Integer;

/// One parsed proof line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofLine {
    pub n: Integer,
    pub a: Integer,
    pub b: Integer,
    pub m: Integer,
    pub q: Integer,
    pub px: Integer,
    pub py: Integer,
}

/// Reserve roughly `7*digits(N)+20` bytes per line, matching §4.9's
/// amortized-growth note.
fn reserve_hint(n: &Integer) -> usize {
    let digits = n.significant_bits() as usize / 3 + 1; // bits -> decimal digits, generous
    7 * digits + 20
}

/// Render the frames produced by a successful `ecpp::prove_outer` into the
/// §6 text format, outermost level first.
pub fn assemble(frames: &[Frame]) -> String {
    let mut out = String::with_capacity(frames.first().map(reserve_hint_frame).unwrap_or(64) * frames.len().max(1));
    for f in frames {
        out.push_str(&f.n.to_string());
        out.push_str(" : ECPP : ");
        out.push_str(&f.a.to_string());
        out.push(' ');
        out.push_str(&f.b.to_string());
        out.push(' ');
        out.push_str(&f.m.to_string());
        out.push(' ');
        out.push_str(&f.q.to_string());
        out.push_str(" (");
        out.push_str(&f.px.to_string());
        out.push(':');
        out.push_str(&f.py.to_string());
        out.push_str(")\n");
    }
    out
}

fn reserve_hint_frame(f: &Frame) -> usize {
    reserve_hint(&f.n)
}

/// Parse the §6 text format into an ordered sequence of `ProofLine`s.
/// Rejects malformed input (wrong token count, non-digit numbers, leading
/// zeros, internal whitespace inside a number) as `InvalidInput`.
pub fn parse(text: &str) -> EResult<Vec<ProofLine>> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let raw = raw.trim_end();
        if raw.is_empty() {
            continue;
        }
        lines.push(parse_line(raw)?);
    }
    Ok(lines)
}

fn parse_line(line: &str) -> EResult<ProofLine> {
    let bad = || EcppError::InvalidInput {
        message: format!("malformed proof line: {}", line),
    };

    let mut parts = line.splitn(3, " : ECPP : ");
    let n_str = parts.next().ok_or_else(bad)?;
    let rest = parts.next().ok_or_else(bad)?;

    let open = rest.find('(').ok_or_else(bad)?;
    let (nums, point) = rest.split_at(open);
    let point = point
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(bad)?;

    let mut num_tokens = nums.split_whitespace();
    let a_str = num_tokens.next().ok_or_else(bad)?;
    let b_str = num_tokens.next().ok_or_else(bad)?;
    let m_str = num_tokens.next().ok_or_else(bad)?;
    let q_str = num_tokens.next().ok_or_else(bad)?;
    if num_tokens.next().is_some() {
        return Err(bad());
    }

    let mut point_parts = point.splitn(2, ':');
    let px_str = point_parts.next().ok_or_else(bad)?;
    let py_str = point_parts.next().ok_or_else(bad)?;

    Ok(ProofLine {
        n: parse_number(n_str.trim())?,
        a: parse_number(a_str)?,
        b: parse_number(b_str)?,
        m: parse_number(m_str)?,
        q: parse_number(q_str)?,
        px: parse_number(px_str)?,
        py: parse_number(py_str)?,
    })
}

fn parse_number(s: &str) -> EResult<Integer> {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return Err(EcppError::InvalidInput {
            message: format!("not a valid proof-certificate number: {:?}", s),
        });
    }
    let (sign, digits) = if let Some(stripped) = s.strip_prefix('-') {
        (-1, stripped)
    } else {
        (1, s)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(EcppError::InvalidInput {
            message: format!("not a valid proof-certificate number: {:?}", s),
        });
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(EcppError::InvalidInput {
            message: format!("leading zero in proof-certificate number: {:?}", s),
        });
    }
    let magnitude = Integer::from_str_radix(digits, 10).map_err(|_| EcppError::InvalidInput {
        message: format!("not a valid proof-certificate number: {:?}", s),
    })?;
    Ok(if sign < 0 { -magnitude } else { magnitude })
}

/// Independently re-verify a full proof chain: per-line arithmetic checks
/// (Hasse bound, `q | m`, the Atkin–Morain bound, point-on-curve, and
/// `ecpp_check_point`), chained so each line's `q` matches the next line's
/// subject, terminating in a BPSW-provable base case.
pub fn verify(lines: &[ProofLine]) -> bool {
    if lines.is_empty() {
        return false;
    }
    for (i, line) in lines.iter().enumerate() {
        if !verify_line(line) {
            return false;
        }
        if i + 1 < lines.len() {
            if lines[i + 1].n != line.q {
                return false;
            }
        } else {
            match is_prob_prime(&line.q) {
                Ok(r) => {
                    if r == BpswResult::Composite {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }
    }
    true
}

fn verify_line(line: &ProofLine) -> bool {
    // Hasse bound: |m - (N+1)| <= 2*sqrt(N).
    let np1 = Integer::from(&line.n + 1u32);
    let diff = Integer::from(&line.m - &np1).abs();
    let bound = Integer::from(line.n.clone().sqrt() * 2u32) + 2u32; // small slack for floor(sqrt)
    if diff > bound {
        return false;
    }
    if !line.m.is_divisible(&line.q) {
        return false;
    }
    let fourth_root = line.n.clone().root(4);
    let am_bound = Integer::from(&fourth_root + 1u32);
    let am_bound = Integer::from(&am_bound * &am_bound);
    if line.q <= am_bound {
        return false;
    }

    let curve = Curve::new(line.a.clone(), line.b.clone(), line.n.clone());
    let p = Point::new(line.px.clone(), line.py.clone());
    if !curve.contains(&p) {
        return false;
    }
    match ecpp_check_point(&curve, &p, &line.m, &line.q) {
        Ok(PointCheck::Success) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        Frame {
            n: Integer::from(97u32),
            a: Integer::from(2u32),
            b: Integer::from(3u32),
            m: Integer::from(104u32),
            q: Integer::from(13u32),
            px: Integer::from(3u32),
            py: Integer::from(6u32),
        }
    }

    #[test]
    fn assemble_then_parse_round_trips() {
        let frames = vec![sample_frame()];
        let text = assemble(&frames);
        assert!(text.starts_with("97 : ECPP : 2 3 104 13 (3:6)"));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].n, Integer::from(97u32));
        assert_eq!(parsed[0].q, Integer::from(13u32));
    }

    #[test]
    fn parse_rejects_leading_zero() {
        let bad = "097 : ECPP : 2 3 104 13 (3:6)\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn parse_rejects_wrong_token_count() {
        let bad = "97 : ECPP : 2 3 104 (3:6)\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn verify_rejects_q_not_dividing_m() {
        let mut frame = sample_frame();
        frame.q = Integer::from(11u32); // 11 does not divide 104
        assert!(!verify(&[frame]));
    }

    #[test]
    fn verify_rejects_point_not_on_curve() {
        let mut frame = sample_frame();
        frame.px = Integer::from(99u32);
        assert!(!verify(&[frame]));
    }
}
