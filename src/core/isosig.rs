//! Isomorphism Signatures
//!
//! An isomorphism signature is a short printable string that identifies a
//! triangulation up to combinatorial isomorphism: two triangulations have
//! the same signature exactly when one can be mapped onto the other by
//! relabelling tetrahedra and their vertices. Signatures therefore double
//! as canonical keys for census lookups and duplicate detection.
//!
//! # Format
//!
//! The alphabet is `a…z A…Z 0…9 + -`, each character carrying six bits.
//! A connected component is encoded from a canonical starting tetrahedron
//! and vertex labelling (chosen to minimise the encoding over all 24·n
//! choices) as:
//!
//! 1. the number of tetrahedra;
//! 2. a sequence of 2-bit slot types in breadth-first order, three per
//!    character: `0` boundary facet, `1` gluing to a newly discovered
//!    tetrahedron, `2` gluing back to an already-seen tetrahedron, with
//!    slots already covered from the partner side skipped;
//! 3. for each type-`2` slot, the destination index and the index of the
//!    relabelled gluing permutation.
//!
//! Gluings to new tetrahedra carry no data: the canonical labelling of the
//! new tetrahedron is chosen so that the gluing becomes the identity.
//! Components are encoded separately, sorted, and concatenated; the empty
//! triangulation is `"a"`.

use thiserror::Error;

use super::collections::{FacetNumber, TetIndex};
use super::perm::Perm4;
use super::triangulation::Triangulation;

const SIG_CHARS: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-";

/// Error type for isomorphism signature parsing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IsoSigError {
    /// A character outside the signature alphabet.
    #[error("Invalid character {character:?} in isomorphism signature")]
    InvalidCharacter {
        /// The offending character.
        character: char,
    },
    /// The signature ended before its encoded content did.
    #[error("Isomorphism signature is truncated")]
    Truncated,
    /// The encoded gluing data is inconsistent.
    #[error("Isomorphism signature describes an impossible gluing: {reason}")]
    Malformed {
        /// What went wrong.
        reason: &'static str,
    },
}

fn symbol_of(ch: char) -> Result<u8, IsoSigError> {
    SIG_CHARS
        .iter()
        .position(|&c| c == ch as u8)
        .map(|i| i as u8)
        .ok_or(IsoSigError::InvalidCharacter { character: ch })
}

// Number of 6-bit symbols needed for indices below `n`.
fn index_symbols(n: usize) -> usize {
    let mut chars = 1;
    while n >= (1usize << (6 * chars)) {
        chars += 1;
    }
    chars
}

// =============================================================================
// ENCODING
// =============================================================================

struct ComponentEncoding {
    symbols: Vec<u8>,
}

// Encodes one connected component starting from the given tetrahedron and
// vertex relabelling, producing the raw 6-bit symbol stream.
fn encode_component(tri: &Triangulation, start: TetIndex, start_perm: Perm4) -> ComponentEncoding {
    let n_total = tri.size();
    let mut label: Vec<Option<usize>> = vec![None; n_total];
    let mut order: Vec<TetIndex> = vec![start];
    let mut vertex_map: Vec<Perm4> = vec![Perm4::IDENTITY; n_total];
    label[start] = Some(0);
    vertex_map[start] = start_perm;

    let mut types: Vec<u8> = Vec::new();
    let mut joins: Vec<(usize, Perm4)> = Vec::new();

    let mut ci = 0;
    while ci < order.len() {
        let t = order[ci];
        let m = vertex_map[t];
        for f_canon in 0..4u8 {
            let f = m.pre(f_canon);
            let Some(g) = tri.gluing(t, f) else {
                types.push(0);
                continue;
            };
            let adj_facet = g.adj_facet(f);
            match label[g.adj] {
                None => {
                    label[g.adj] = Some(order.len());
                    vertex_map[g.adj] = m * g.perm.inverse();
                    order.push(g.adj);
                    types.push(1);
                }
                Some(dest) => {
                    // Skip if the partner slot was processed first.
                    let partner = (dest, vertex_map[g.adj].apply(adj_facet));
                    if partner < (ci, f_canon) || (g.adj == t && partner == (ci, f_canon)) {
                        continue;
                    }
                    types.push(2);
                    joins.push((dest, vertex_map[g.adj] * g.perm * m.inverse()));
                }
            }
        }
        ci += 1;
    }

    let n = order.len();
    let n_chars = index_symbols(n);
    let mut symbols: Vec<u8> = Vec::new();
    if n < 63 {
        symbols.push(n as u8);
    } else {
        symbols.push(63);
        symbols.push(n_chars as u8);
        let mut rest = n;
        for _ in 0..n_chars {
            symbols.push((rest & 0x3f) as u8);
            rest >>= 6;
        }
    }
    for chunk in types.chunks(3) {
        let mut value = 0u8;
        for (i, &t) in chunk.iter().enumerate() {
            value |= t << (2 * i);
        }
        symbols.push(value);
    }
    for (dest, perm) in joins {
        let mut rest = dest;
        for _ in 0..n_chars {
            symbols.push((rest & 0x3f) as u8);
            rest >>= 6;
        }
        symbols.push(perm.index() as u8);
    }
    ComponentEncoding { symbols }
}

/// Computes the isomorphism signature of a triangulation.
#[must_use]
pub fn isosig(tri: &Triangulation) -> String {
    if tri.is_empty() {
        return "a".to_string();
    }
    let skel = tri.skeleton();
    let n_comp = skel.components().len();
    let mut best: Vec<Option<Vec<u8>>> = vec![None; n_comp];
    for start in 0..tri.size() {
        let comp = skel.tet_component()[start];
        for p in Perm4::all() {
            let candidate = encode_component(tri, start, p).symbols;
            match &best[comp] {
                Some(existing) if *existing <= candidate => {}
                _ => best[comp] = Some(candidate),
            }
        }
    }
    let mut parts: Vec<Vec<u8>> = best.into_iter().flatten().collect();
    parts.sort();
    let mut out = String::new();
    for part in parts {
        for symbol in part {
            out.push(SIG_CHARS[usize::from(symbol)] as char);
        }
    }
    out
}

// =============================================================================
// DECODING
// =============================================================================

struct SymbolStream {
    symbols: Vec<u8>,
    pos: usize,
}

impl SymbolStream {
    fn next(&mut self) -> Result<u8, IsoSigError> {
        let s = self
            .symbols
            .get(self.pos)
            .copied()
            .ok_or(IsoSigError::Truncated)?;
        self.pos += 1;
        Ok(s)
    }

    fn next_index(&mut self, n_chars: usize) -> Result<usize, IsoSigError> {
        let mut value = 0usize;
        for i in 0..n_chars {
            value |= usize::from(self.next()?) << (6 * i);
        }
        Ok(value)
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.symbols.len()
    }
}

/// Reconstructs a triangulation from an isomorphism signature.
///
/// # Errors
///
/// Returns an [`IsoSigError`] if the string contains characters outside the
/// signature alphabet, ends prematurely, or describes an impossible gluing.
pub fn from_isosig(sig: &str) -> Result<Triangulation, IsoSigError> {
    let symbols: Vec<u8> = sig.chars().map(symbol_of).collect::<Result<_, _>>()?;
    let mut stream = SymbolStream { symbols, pos: 0 };
    let mut result = Triangulation::new();
    while !stream.exhausted() {
        decode_component(&mut stream, &mut result)?;
    }
    Ok(result)
}

fn decode_component(
    stream: &mut SymbolStream,
    result: &mut Triangulation,
) -> Result<(), IsoSigError> {
    let first = stream.next()?;
    let (n, n_chars) = if first < 63 {
        (usize::from(first), 1)
    } else {
        let n_chars = usize::from(stream.next()?);
        if n_chars == 0 || n_chars > 10 {
            return Err(IsoSigError::Malformed {
                reason: "unreasonable size width",
            });
        }
        (stream.next_index(n_chars)?, n_chars)
    };
    if n == 0 {
        return Ok(());
    }

    // Read slot types until they account for all 4n facet slots.
    let mut types: Vec<u8> = Vec::new();
    let mut covered = 0usize;
    while covered < 4 * n {
        let packed = stream.next()?;
        for i in 0..3 {
            if covered >= 4 * n {
                if (packed >> (2 * i)) & 0x3 != 0 {
                    return Err(IsoSigError::Malformed {
                        reason: "padding bits must be zero",
                    });
                }
                continue;
            }
            let t = (packed >> (2 * i)) & 0x3;
            match t {
                0 => covered += 1,
                1 | 2 => covered += 2,
                _ => {
                    return Err(IsoSigError::Malformed {
                        reason: "unknown slot type",
                    })
                }
            }
            types.push(t);
        }
    }
    if covered != 4 * n {
        return Err(IsoSigError::Malformed {
            reason: "slot types overrun the facet count",
        });
    }

    let offset = result.new_tetrahedra(n);
    let mut next_free = 1usize;
    let mut type_iter = types.into_iter();
    for slot in 0..4 * n {
        let (t, f) = (slot / 4, (slot % 4) as FacetNumber);
        if result.gluing(offset + t, f).is_some() {
            continue;
        }
        let ty = type_iter.next().ok_or(IsoSigError::Malformed {
            reason: "slot types exhausted early",
        })?;
        match ty {
            0 => {}
            1 => {
                if next_free >= n {
                    return Err(IsoSigError::Malformed {
                        reason: "more tetrahedra discovered than declared",
                    });
                }
                result
                    .glue(offset + t, f, offset + next_free, f, Perm4::IDENTITY)
                    .map_err(|_| IsoSigError::Malformed {
                        reason: "inconsistent gluing to a new tetrahedron",
                    })?;
                next_free += 1;
            }
            2 => {
                let dest = stream.next_index(n_chars)?;
                let perm_index = usize::from(stream.next()?);
                if dest >= n {
                    return Err(IsoSigError::Malformed {
                        reason: "destination tetrahedron out of range",
                    });
                }
                let perm = Perm4::from_index(perm_index).map_err(|_| IsoSigError::Malformed {
                    reason: "permutation index out of range",
                })?;
                result
                    .glue(offset + t, f, offset + dest, perm.apply(f), perm)
                    .map_err(|_| IsoSigError::Malformed {
                        reason: "inconsistent gluing between seen tetrahedra",
                    })?;
            }
            _ => unreachable!("types were validated while reading"),
        }
    }
    if next_free != n {
        return Err(IsoSigError::Malformed {
            reason: "component is not connected",
        });
    }
    Ok(())
}
