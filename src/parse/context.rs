use super::error::{LocatedError, ValueError};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Root,
    Index(usize),
    Key(&'a str),
}

/// Where in a parameter value the decoder currently is.
///
/// Each context borrows its parent, so descending into a child never mutates
/// the parent and the parent's path is intact again as soon as the child goes
/// out of scope, whether or not the child decoded successfully.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    name: &'a str,
    parent: Option<&'a ParseContext<'a>>,
    segment: Segment<'a>,
    depth: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(name: &'a str) -> Self {
        ParseContext {
            name,
            parent: None,
            segment: Segment::Root,
            depth: 0,
        }
    }

    /// Context for element `index` of the current array.
    pub fn index(&self, index: usize) -> ParseContext<'_> {
        ParseContext {
            name: self.name,
            parent: Some(self),
            segment: Segment::Index(index),
            depth: self.depth + 1,
        }
    }

    /// Context for property `key` of the current object.
    pub fn key<'b>(&'b self, key: &'b str) -> ParseContext<'b> {
        ParseContext {
            name: self.name,
            parent: Some(self),
            segment: Segment::Key(key),
            depth: self.depth + 1,
        }
    }

    /// Number of array/object levels below the parameter itself.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Render as `name`, `name[2]`, `name.key[0]`, ...
    pub fn path(&self) -> String {
        let mut segments: SmallVec<[Segment<'_>; 8]> = SmallVec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            segments.push(ctx.segment);
            current = ctx.parent;
        }

        let mut path = String::from(self.name);
        for segment in segments.iter().rev() {
            match segment {
                Segment::Root => {}
                Segment::Index(i) => {
                    path.push('[');
                    path.push_str(&i.to_string());
                    path.push(']');
                }
                Segment::Key(k) => {
                    path.push('.');
                    path.push_str(k);
                }
            }
        }
        path
    }

    /// Attach this context's path to an error.
    pub fn locate(&self, error: ValueError) -> LocatedError {
        LocatedError {
            path: self.path(),
            error,
        }
    }
}
