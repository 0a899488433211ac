//! Combinatorial query sets.
//!
//! A [`QuerySet`] is a template with K positional slots plus K argument
//! lists. The cross product of the lists is never materialized; instead a
//! flat index `0..size` is unranked into per-dimension indices on demand
//! ([`unravel_index`]), so any query in a multi-million-member set costs the
//! same to produce and any subrange can be generated independently.

use std::fmt;

use crate::BenchError;

/// Mixed-radix decomposition of a flat index. Dimension 0 cycles fastest:
/// with `dims = [d0, d1, ...]`, `index_i = (n / (d0*..*d_{i-1})) % d_i`.
pub fn unravel_index(n: usize, dims: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(dims.len());
    let mut denom = 1usize;
    for &d in dims {
        out.push((n / denom) % d);
        denom *= d;
    }
    out
}

/// Inverse of [`unravel_index`]: recombine per-dimension indices into the
/// flat index.
pub fn ravel_index(indices: &[usize], dims: &[usize]) -> usize {
    let mut n = 0usize;
    let mut denom = 1usize;
    for (&i, &d) in indices.iter().zip(dims) {
        n += i * denom;
        denom *= d;
    }
    n
}

/// Integer range `[start, stop)` with the given step, for building
/// contiguous id lists.
pub fn arange(start: i64, stop: i64, step: i64) -> Vec<i64> {
    let mut out = Vec::new();
    let mut v = start;
    while v < stop {
        out.push(v);
        v += step;
    }
    out
}

/// One argument bound into a template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Int,
    Str,
}

/// A query template with typed positional slots (`%d` for integers, `%s` for
/// strings). Slot positions are resolved once at construction; filling is a
/// single scan.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    slots: Vec<(usize, SlotKind)>,
}

impl Template {
    pub fn new(text: &str) -> Result<Template, BenchError> {
        let bytes = text.as_bytes();
        let mut slots = Vec::new();
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == b'%' {
                match bytes[i + 1] {
                    b'd' => slots.push((i, SlotKind::Int)),
                    b's' => slots.push((i, SlotKind::Str)),
                    c => {
                        return Err(BenchError::Template(format!(
                            "unsupported verb %{} at byte {}",
                            c as char, i
                        )))
                    }
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        Ok(Template { text: text.to_string(), slots })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Fill the template with one argument per slot. Arity and type mismatch
    /// are construction-time errors in [`QuerySet::new`], so this only sees
    /// well-formed input.
    fn fill(&self, args: &[&Arg]) -> String {
        let mut out = String::with_capacity(self.text.len() + 8 * args.len());
        let mut last = 0;
        for (&(pos, _), arg) in self.slots.iter().zip(args) {
            out.push_str(&self.text[last..pos]);
            match arg {
                Arg::Int(v) => {
                    use std::fmt::Write;
                    let _ = write!(out, "{}", v);
                }
                Arg::Str(s) => out.push_str(s),
            }
            last = pos + 2;
        }
        out.push_str(&self.text[last..]);
        out
    }

    fn check(&self, arg_sets: &[Vec<Arg>]) -> Result<(), BenchError> {
        if arg_sets.len() != self.slots.len() {
            return Err(BenchError::Template(format!(
                "template has {} slots but {} argument lists were given",
                self.slots.len(),
                arg_sets.len()
            )));
        }
        for (i, ((_, kind), set)) in self.slots.iter().zip(arg_sets).enumerate() {
            for arg in set {
                let ok = matches!(
                    (kind, arg),
                    (SlotKind::Int, Arg::Int(_)) | (SlotKind::Str, Arg::Str(_))
                );
                if !ok {
                    return Err(BenchError::Template(format!(
                        "argument list {} does not match slot type {:?}",
                        i, kind
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One materialized member of a query set: the query text plus the argument
/// tuple that produced it, with room for the engine's answer.
#[derive(Debug, Clone)]
pub struct QueryRow {
    pub query: String,
    pub inputs: Vec<Arg>,
    pub value: Option<i64>,
}

/// A named family of queries defined by a template and per-slot argument
/// lists. `size()` is the product of the list lengths; an empty list makes
/// the set degenerate (size 0), not an error.
#[derive(Debug, Clone)]
pub struct QuerySet {
    name: String,
    template: Template,
    arg_sets: Vec<Vec<Arg>>,
    lengths: Vec<usize>,
    size: usize,
}

impl QuerySet {
    pub fn new(name: &str, format: &str, arg_sets: Vec<Vec<Arg>>) -> Result<QuerySet, BenchError> {
        let template = Template::new(format)?;
        template.check(&arg_sets)?;
        let lengths: Vec<usize> = arg_sets.iter().map(|s| s.len()).collect();
        // empty product is 1 (a slotless template is one query); any empty
        // argument list zeroes the whole set
        let size = lengths.iter().product::<usize>();
        Ok(QuerySet { name: name.to_string(), template, arg_sets, lengths, size })
    }

    /// Convenience constructor for the common all-integer case.
    pub fn ints(name: &str, format: &str, arg_sets: Vec<Vec<i64>>) -> Result<QuerySet, BenchError> {
        let arg_sets = arg_sets
            .into_iter()
            .map(|set| set.into_iter().map(Arg::Int).collect())
            .collect();
        QuerySet::new(name, format, arg_sets)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Argument tuple for the n-th member. Pure; any thread may call it for
    /// any index concurrently.
    pub fn args_at(&self, n: usize) -> Vec<&Arg> {
        unravel_index(n, &self.lengths)
            .iter()
            .zip(&self.arg_sets)
            .map(|(&i, set)| &set[i])
            .collect()
    }

    /// Query text for the n-th member.
    pub fn query_at(&self, n: usize) -> String {
        self.template.fill(&self.args_at(n))
    }

    /// Full row (text plus inputs) for the n-th member.
    pub fn row_at(&self, n: usize) -> QueryRow {
        let inputs: Vec<Arg> = self.args_at(n).into_iter().cloned().collect();
        QueryRow { query: self.template.fill(&self.args_at(n)), inputs, value: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unravel_first_dimension_cycles_fastest() {
        let dims = [3, 2, 5];
        assert_eq!(unravel_index(0, &dims), vec![0, 0, 0]);
        assert_eq!(unravel_index(1, &dims), vec![1, 0, 0]);
        assert_eq!(unravel_index(3, &dims), vec![0, 1, 0]);
        assert_eq!(unravel_index(6, &dims), vec![0, 0, 1]);
        assert_eq!(unravel_index(29, &dims), vec![2, 1, 4]);
    }

    #[test]
    fn ravel_inverts_unravel() {
        let dims = [3, 2, 5];
        let size: usize = dims.iter().product();
        assert_eq!(size, 30);
        let mut seen = vec![false; size];
        for n in 0..size {
            let idx = unravel_index(n, &dims);
            assert_eq!(ravel_index(&idx, &dims), n);
            assert!(!seen[n]);
            seen[n] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn arange_half_open() {
        assert_eq!(arange(0, 5, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(arange(40, 80, 13), vec![40, 53, 66, 79]);
        assert!(arange(3, 3, 1).is_empty());
    }

    #[test]
    fn query_set_enumeration_order() {
        let qs = QuerySet::ints("q", "V(%d,%d)", vec![vec![1, 2], vec![10, 20, 30]]).unwrap();
        assert_eq!(qs.size(), 6);
        assert_eq!(qs.query_at(0), "V(1,10)");
        assert_eq!(qs.query_at(1), "V(2,10)");
        assert_eq!(qs.query_at(2), "V(1,20)");
        assert_eq!(qs.query_at(5), "V(2,30)");
        let row = qs.row_at(2);
        assert_eq!(row.inputs, vec![Arg::Int(1), Arg::Int(20)]);
        assert_eq!(row.value, None);
    }

    #[test]
    fn degenerate_set_is_empty_not_an_error() {
        let qs = QuerySet::ints("q", "V(%d,%d)", vec![vec![], vec![10, 20]]).unwrap();
        assert_eq!(qs.size(), 0);
    }

    #[test]
    fn mixed_slot_types() {
        let qs = QuerySet::new(
            "q",
            "Row(%s=%d)",
            vec![vec![Arg::Str("year".into())], vec![Arg::Int(3)]],
        )
        .unwrap();
        assert_eq!(qs.query_at(0), "Row(year=3)");
    }

    #[test]
    fn arity_and_type_mismatch_are_errors() {
        assert!(QuerySet::ints("q", "V(%d,%d)", vec![vec![1]]).is_err());
        assert!(QuerySet::new("q", "V(%d)", vec![vec![Arg::Str("x".into())]]).is_err());
        assert!(Template::new("V(%q)").is_err());
    }
}
