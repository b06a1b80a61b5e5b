//! Text edits recorded against an immutable source buffer.
//!
//! Inserts attach to the character before their offset: a replacement of
//! `[s, e)` swallows earlier inserts at `s < o <= e` while inserts at `s`
//! stay in front of it. Replacements either nest, in which case the newer
//! outer one wins, or are disjoint.

use text_size::{TextRange, TextSize};

use crate::error::EditError;

#[derive(Debug)]
struct Insert {
    offset: TextSize,
    text: String,
    /// Position among inserts at the same offset. Prepends are negative so
    /// that the latest prepend comes first.
    order: i64,
    subsumed: bool,
}

#[derive(Debug)]
struct Replacement {
    range: TextRange,
    text: String,
    active: bool,
}

#[derive(Debug)]
pub struct Editor<'s> {
    source: &'s str,
    inserts: Vec<Insert>,
    replacements: Vec<Replacement>,
    seq: i64,
}

impl<'s> Editor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, inserts: Vec::new(), replacements: Vec::new(), seq: 0 }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Number of edit calls recorded so far.
    pub fn edit_count(&self) -> usize {
        self.seq as usize
    }

    fn next_seq(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }

    fn check_insert(&self, offset: TextSize) -> Result<(), EditError> {
        match self.active().find(|r| r.range.start() < offset && offset < r.range.end()) {
            Some(r) => Err(EditError::Overlapping {
                existing: r.range,
                new: TextRange::empty(offset),
            }),
            None => Ok(()),
        }
    }

    /// Appends `text` at `offset`, after everything inserted there before.
    pub fn insert(&mut self, offset: TextSize, text: impl Into<String>) -> Result<(), EditError> {
        self.check_insert(offset)?;
        let order = self.next_seq();
        self.inserts.push(Insert { offset, text: text.into(), order, subsumed: false });
        Ok(())
    }

    /// Inserts `text` at `offset`, before everything inserted there before.
    pub fn prepend(&mut self, offset: TextSize, text: impl Into<String>) -> Result<(), EditError> {
        self.check_insert(offset)?;
        let order = -self.next_seq();
        self.inserts.push(Insert { offset, text: text.into(), order, subsumed: false });
        Ok(())
    }

    pub fn remove(&mut self, range: TextRange) -> Result<(), EditError> {
        if range.is_empty() {
            return Ok(());
        }
        self.overwrite(range, "")
    }

    pub fn overwrite(
        &mut self,
        range: TextRange,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        if range.is_empty() {
            return self.insert(range.start(), text);
        }

        for existing in self.active() {
            let nested = range.contains_range(existing.range);
            let overlaps = existing
                .range
                .intersect(range)
                .is_some_and(|intersection| !intersection.is_empty());
            if overlaps && !nested {
                return Err(EditError::Overlapping { existing: existing.range, new: range });
            }
        }

        self.next_seq();
        for existing in &mut self.replacements {
            if existing.active && range.contains_range(existing.range) {
                existing.active = false;
            }
        }
        for insert in &mut self.inserts {
            if range.start() < insert.offset && insert.offset <= range.end() {
                insert.subsumed = true;
            }
        }
        self.replacements.push(Replacement { range, text: text.into(), active: true });
        Ok(())
    }

    fn active(&self) -> impl Iterator<Item = &Replacement> {
        self.replacements.iter().filter(|r| r.active)
    }

    fn check_bounds(&self, range: TextRange) -> Result<(), EditError> {
        let len = self.source.len();
        let fits = |offset: TextSize| {
            let offset = usize::from(offset);
            offset <= len && self.source.is_char_boundary(offset)
        };
        if fits(range.start()) && fits(range.end()) {
            Ok(())
        } else {
            Err(EditError::Render { range })
        }
    }

    pub fn render(&self) -> Result<String, EditError> {
        for insert in &self.inserts {
            self.check_bounds(TextRange::empty(insert.offset))?;
        }
        for replacement in &self.replacements {
            self.check_bounds(replacement.range)?;
        }

        let full = TextRange::up_to(TextSize::of(self.source));
        self.render_between(full, true)
    }

    /// Rendered text of an original range: replacements inside it and
    /// inserts at `start < o <= end`.
    pub fn render_range(&self, range: TextRange) -> Result<String, EditError> {
        self.check_crossing(range)?;
        self.render_between(range, false)
    }

    /// Like [`Editor::render_range`], also taking the inserts at `start`.
    pub fn render_range_inclusive(&self, range: TextRange) -> Result<String, EditError> {
        self.check_crossing(range)?;
        self.render_between(range, true)
    }

    fn check_crossing(&self, range: TextRange) -> Result<(), EditError> {
        self.check_bounds(range)?;
        for replacement in self.active() {
            let r = replacement.range;
            let crosses = (r.start() < range.start() && range.start() < r.end())
                || (r.start() < range.end() && range.end() < r.end());
            if crosses {
                return Err(EditError::Overlapping { existing: r, new: range });
            }
        }
        Ok(())
    }

    fn render_between(&self, range: TextRange, leading_inserts: bool) -> Result<String, EditError> {
        let in_range = |offset: TextSize| {
            (offset > range.start() || (leading_inserts && offset == range.start()))
                && offset <= range.end()
        };

        let mut inserts = self
            .inserts
            .iter()
            .filter(|insert| !insert.subsumed && in_range(insert.offset))
            .collect::<Vec<_>>();
        inserts.sort_by_key(|insert| (insert.offset, insert.order));

        let mut replacements = self
            .active()
            .filter(|r| range.contains_range(r.range))
            .collect::<Vec<_>>();
        replacements.sort_by_key(|r| r.range.start());

        let mut stops = inserts
            .iter()
            .map(|insert| insert.offset)
            .chain(replacements.iter().map(|r| r.range.start()))
            .collect::<Vec<_>>();
        stops.sort();
        stops.dedup();

        let mut out = String::new();
        let mut pos = range.start();
        for stop in stops {
            if stop < pos {
                continue;
            }
            out.push_str(self.slice(TextRange::new(pos, stop))?);
            pos = stop;

            for insert in inserts.iter().filter(|insert| insert.offset == stop) {
                out.push_str(&insert.text);
            }
            if let Some(replacement) = replacements.iter().find(|r| r.range.start() == stop) {
                out.push_str(&replacement.text);
                pos = replacement.range.end();
            }
        }
        out.push_str(self.slice(TextRange::new(pos, range.end()))?);
        Ok(out)
    }

    /// Original text of a range, ignoring edits.
    pub fn slice(&self, range: TextRange) -> Result<&'s str, EditError> {
        self.source.get(range.start().into()..range.end().into()).ok_or(EditError::Render { range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn inserts_keep_call_order() {
        let mut editor = Editor::new("ab");
        editor.insert(1.into(), "1").unwrap();
        editor.insert(1.into(), "2").unwrap();
        editor.prepend(1.into(), "0").unwrap();
        assert_eq!(editor.render().unwrap(), "a012b");
    }

    #[test]
    fn remove_and_overwrite() {
        let mut editor = Editor::new("a and b");
        editor.overwrite(range(2, 5), "&&").unwrap();
        editor.remove(range(0, 0)).unwrap();
        assert_eq!(editor.render().unwrap(), "a && b");

        editor.overwrite(range(2, 5), "||").unwrap();
        assert_eq!(editor.render().unwrap(), "a || b");
    }

    #[test]
    fn outer_overwrite_subsumes_inner_edits() {
        let mut editor = Editor::new("f(a + b)");
        editor.overwrite(range(4, 5), "-").unwrap();
        editor.insert(5.into(), " /* after */").unwrap();
        editor.overwrite(range(0, 8), "g()").unwrap();
        assert_eq!(editor.render().unwrap(), "g()");
    }

    #[test]
    fn inserts_at_replacement_boundaries_survive() {
        let mut editor = Editor::new("abc");
        editor.insert(1.into(), "(").unwrap();
        editor.overwrite(range(1, 2), "B").unwrap();
        editor.insert(2.into(), ")").unwrap();
        assert_eq!(editor.render().unwrap(), "a(B)c");
    }

    #[test]
    fn partial_overlap_is_rejected() {
        let mut editor = Editor::new("abcdef");
        editor.overwrite(range(1, 4), "x").unwrap();
        assert_eq!(
            editor.overwrite(range(3, 5), "y"),
            Err(EditError::Overlapping { existing: range(1, 4), new: range(3, 5) })
        );
        assert!(editor.overwrite(range(2, 3), "z").is_err());
        assert!(editor.insert(2.into(), "z").is_err());
        assert!(editor.overwrite(range(4, 5), "w").is_ok());
        assert_eq!(editor.render().unwrap(), "axwf");
    }

    #[test]
    fn render_range_includes_trailing_inserts() {
        let mut editor = Editor::new("a for x in y");
        editor.insert(2.into(), "skipped").unwrap();
        editor.insert(12.into(), ")").unwrap();
        editor.insert(11.into(), "(").unwrap();
        editor.overwrite(range(8, 10), "IN").unwrap();
        assert_eq!(editor.render_range(range(2, 12)).unwrap(), "for x IN (y)");
        assert_eq!(editor.render_range_inclusive(range(2, 12)).unwrap(), "skippedfor x IN (y)");
        assert!(editor.render_range(range(9, 12)).is_err());
    }

    #[test]
    fn out_of_bounds_edits_fail_to_render() {
        let mut editor = Editor::new("é");
        editor.insert(1.into(), "x").unwrap();
        assert_eq!(editor.render(), Err(EditError::Render { range: range(1, 1) }));

        let mut editor = Editor::new("ab");
        editor.overwrite(range(1, 9), "x").unwrap();
        assert!(editor.render().is_err());
    }
}
