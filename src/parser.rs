/// Pattern parser: converts a pattern string into an arena AST.
///
/// All state that outlives a single call (the `\i` marking flag, the
/// invalidation candidates, the group tables) lives in a
/// [`CompilationContext`], so `[:macro:]` expansions can be parsed by a
/// nested `Parser` that shares it.

use tracing::trace;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::charset::{CharSet, MAX_SET_CHAR, Shorthand};
use crate::error::GenError;
use crate::posix;

/// Characters that end a literal run.
const METACHARS: &str = "-*+?(){}\\[]^$.|";

/// Largest bound accepted in `{n,m}`.
pub const MAX_REPEAT: usize = 100_000;

/// Result of compiling one pattern.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub ast: Ast,
    pub root: NodeId,
    /// Nodes created under an `\i` marker, in creation order.
    pub candidates: Vec<NodeId>,
    /// Whether the pattern used the `\i` marker at all.
    pub has_marker: bool,
}

/// Mutable state shared by every parser working on one pattern.
#[derive(Debug, Default)]
pub struct CompilationContext {
    ast: Ast,
    marking: bool,
    has_marker: bool,
    candidates: Vec<NodeId>,
    /// Capturing groups opened so far (closed or not).
    group_count: usize,
    /// Closed numbered groups as `(number, node)`.
    indexed_groups: Vec<(usize, NodeId)>,
    /// Closed named groups in declaration order.
    named_groups: Vec<NodeId>,
}

impl CompilationContext {
    pub fn new() -> Self {
        CompilationContext::default()
    }

    /// Named groups are numbered after every numbered group.
    fn finish(mut self, root: NodeId) -> Compiled {
        let base = self.group_count;
        for (offset, id) in self.named_groups.iter().enumerate() {
            if let NodeKind::Group { capture, .. } = self.ast.kind_mut(*id) {
                *capture = Some(base + offset + 1);
            }
        }
        Compiled {
            ast: self.ast,
            root,
            candidates: self.candidates,
            has_marker: self.has_marker,
        }
    }
}

/// Compile `pattern` into an AST.
pub fn compile(pattern: &str) -> Result<Compiled, GenError> {
    let mut ctx = CompilationContext::new();
    let root = Parser::new(pattern, &mut ctx).parse()?;
    let compiled = ctx.finish(root);
    trace!(
        pattern,
        nodes = compiled.ast.len(),
        candidates = compiled.candidates.len(),
        "compiled pattern"
    );
    Ok(compiled)
}

/// An item inside `[...]`.
enum ClassItem {
    Char(char),
    Shorthand(Shorthand),
}

pub struct Parser<'c> {
    chars: Vec<char>,
    pos: usize,
    ctx: &'c mut CompilationContext,
}

impl<'c> Parser<'c> {
    pub fn new(pattern: &str, ctx: &'c mut CompilationContext) -> Self {
        Parser {
            chars: pattern.chars().collect(),
            pos: 0,
            ctx,
        }
    }

    /// Parse the full pattern and return the root node.
    pub fn parse(&mut self) -> Result<NodeId, GenError> {
        let node = self.parse_alternation()?;
        if let Some(ch) = self.peek() {
            return Err(self.error(format!("Unexpected character '{}'", ch)));
        }
        Ok(node)
    }

    fn error(&self, message: impl Into<String>) -> GenError {
        GenError::syntax(self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn expect(&mut self, expected: char) -> Result<(), GenError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("Expected '{}', got '{}'", expected, c))),
            None => Err(self.error(format!("Expected '{}', got end of pattern", expected))),
        }
    }

    fn at_marker(&self) -> bool {
        self.peek() == Some('\\') && self.char_at(self.pos + 1) == Some('i')
    }

    fn consume_marker(&mut self) {
        self.pos += 2;
        self.ctx.has_marker = true;
    }

    /// Add a node, adopt its children and record it if marking is active.
    fn push(&mut self, kind: NodeKind) -> NodeId {
        let ast = &mut self.ctx.ast;
        let id = ast.push(kind);
        for child in ast.children(id) {
            ast.set_parent(child, id);
        }
        if self.ctx.marking {
            self.ctx.candidates.push(id);
        }
        id
    }

    /// Parse alternation: `a|b|c`
    fn parse_alternation(&mut self) -> Result<NodeId, GenError> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some('|') {
            self.advance(); // consume '|'
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches[0])
        } else {
            Ok(self.push(NodeKind::Alternation(branches)))
        }
    }

    /// Parse concatenation: `abc`. An empty branch produces empty text.
    fn parse_concat(&mut self) -> Result<NodeId, GenError> {
        let mut nodes = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            nodes.push(self.parse_piece()?);
        }
        match nodes.len() {
            0 => Ok(self.push(NodeKind::Text(String::new()))),
            1 => Ok(nodes[0]),
            _ => Ok(self.push(NodeKind::Concat(nodes))),
        }
    }

    /// Parse an atom, an optional quantifier and any `\i` markers around them.
    fn parse_piece(&mut self) -> Result<NodeId, GenError> {
        let outer = self.ctx.marking;
        let first_node = self.ctx.ast.len();

        // `\i` before the atom marks the atom's whole subtree.
        if self.at_marker() {
            self.consume_marker();
            self.ctx.marking = true;
        }
        let atom = self.parse_atom()?;
        self.ctx.marking = outer;

        // `\i` between atom and quantifier marks only the repeat.
        if self.at_marker() && matches!(self.char_at(self.pos + 2), Some('*' | '+' | '?' | '{')) {
            self.consume_marker();
            self.ctx.marking = true;
        }
        let node = self.parse_quantified(atom)?;
        self.ctx.marking = outer;

        // `\i` closing a branch marks the piece before it.
        if self.at_marker() && matches!(self.char_at(self.pos + 2), None | Some('|' | ')')) {
            self.consume_marker();
            let last_node = self.ctx.ast.len();
            self.ctx
                .candidates
                .extend((first_node..last_node).map(NodeId));
        }
        Ok(node)
    }

    /// Parse an optional quantifier following `atom`.
    fn parse_quantified(&mut self, atom: NodeId) -> Result<NodeId, GenError> {
        let (min, max, same_value) = match self.peek() {
            Some('*') => {
                self.advance();
                (0, None, false)
            }
            Some('+') => {
                self.advance();
                (1, None, false)
            }
            Some('?') => {
                self.advance();
                (0, Some(1), false)
            }
            Some('{') => self.parse_brace_quantifier()?,
            _ => return Ok(atom),
        };
        if self.peek() == Some('?') {
            return Err(self.error("Lazy quantifiers are not supported"));
        }
        Ok(self.push(NodeKind::Repeat {
            child: atom,
            min,
            max,
            same_value,
        }))
    }

    /// Parse `{n}`, `{n,}`, `{n,m}` and the same-value forms `{=n}`, `{=n,m}`.
    fn parse_brace_quantifier(&mut self) -> Result<(usize, Option<usize>, bool), GenError> {
        self.advance(); // consume '{'
        let same_value = if self.peek() == Some('=') {
            self.advance();
            true
        } else {
            false
        };

        let min = self.parse_number()?;
        let max = if self.peek() == Some(',') {
            self.advance(); // consume ','
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        self.expect('}')?;

        if let Some(max) = max {
            if max < min {
                return Err(self.error("Max repeat is less than min repeat"));
            }
        }
        Ok((min, max, same_value))
    }

    fn parse_number(&mut self) -> Result<usize, GenError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("Repeat values cannot be parsed"));
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        let value = s
            .parse::<usize>()
            .map_err(|e| GenError::syntax(start, format!("Repeat value '{}': {}", s, e)))?;
        if value > MAX_REPEAT {
            return Err(GenError::syntax(
                start,
                format!("Repeat value {} exceeds the limit of {}", value, MAX_REPEAT),
            ));
        }
        Ok(value)
    }

    /// Parse a single atom (literal run, set, group, anchor, escape).
    fn parse_atom(&mut self) -> Result<NodeId, GenError> {
        match self.peek() {
            None => Err(self.error("Reached end of pattern, no element found")),
            Some('|' | ')' | '?' | '*' | '+' | '{' | '}') => {
                Err(self.error("No element found before quantifier or delimiter"))
            }
            Some('(') => self.parse_group(),
            Some('[') => {
                if self.char_at(self.pos + 1) == Some(':') {
                    self.parse_macro()
                } else {
                    self.parse_char_class()
                }
            }
            Some('.') => {
                self.advance();
                let mut set = CharSet::new(true);
                set.add_range('\0', '\x09');
                set.add_range('\x0B', '\x7F');
                Ok(self.push(NodeKind::Set(set)))
            }
            Some('^' | '$') => {
                self.advance();
                Ok(self.push(NodeKind::Text(String::new())))
            }
            Some('\\') => self.parse_escape(),
            Some(_) => Ok(self.parse_literal_run()),
        }
    }

    /// Consume characters up to the next metacharacter as one text node.
    /// The first character is taken unconditionally so stray `]` and `-` are literal.
    fn parse_literal_run(&mut self) -> NodeId {
        let start = self.pos;
        self.pos += 1;
        while let Some(ch) = self.peek() {
            if METACHARS.contains(ch) {
                break;
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(NodeKind::Text(text))
    }

    /// Parse an escape sequence outside of a set.
    fn parse_escape(&mut self) -> Result<NodeId, GenError> {
        let start = self.pos;
        self.advance(); // consume '\\'
        let Some(ch) = self.peek() else {
            return Err(self.error("Unexpected end of pattern after '\\'"));
        };

        if let Some(kind) = Shorthand::from_escape(ch) {
            self.advance();
            return Ok(self.push(NodeKind::Set(CharSet::from_shorthand(kind))));
        }

        match ch {
            'x' | 'u' | '0' => {
                let value = self.parse_escape_value()?;
                Ok(self.push(NodeKind::Text(value.to_string())))
            }
            '1'..='9' => {
                let number = self.parse_decimal()?;
                let target = self.group_by_number(number).ok_or_else(|| {
                    GenError::syntax(start, format!("Dangling backreference \\{}", number))
                })?;
                Ok(self.push(NodeKind::Backref { target }))
            }
            'k' => {
                self.advance();
                let name = self.parse_group_name()?;
                let target = self.group_by_name(&name).ok_or_else(|| {
                    GenError::syntax(start, format!("Dangling backreference \\k<{}>", name))
                })?;
                Ok(self.push(NodeKind::Backref { target }))
            }
            'A' | 'Z' | 'z' => {
                self.advance();
                Ok(self.push(NodeKind::Text(String::new())))
            }
            'i' => Err(self.error("Misplaced invalidation marker")),
            'b' | 'B' => Err(self.error("Word boundaries are not supported")),
            _ => {
                let literal = match ch {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'f' => '\x0C',
                    'v' => '\x0B',
                    'a' => '\x07',
                    'e' => '\x1B',
                    c if c.is_ascii_punctuation() || c == ' ' => c,
                    c => return Err(self.error(format!("Invalid escape '\\{}'", c))),
                };
                self.advance();
                Ok(self.push(NodeKind::Text(literal.to_string())))
            }
        }
    }

    /// Parse the numeric escapes `\xHH`, `\uHHHH`, `\0oo` and decimal `\NNN`.
    /// `self.pos` points at the character after the backslash.
    fn parse_escape_value(&mut self) -> Result<char, GenError> {
        let start = self.pos;
        let value = match self.peek() {
            Some('x') => {
                self.advance();
                self.parse_hex(2)?
            }
            Some('u') => {
                self.advance();
                self.parse_hex(4)?
            }
            Some('0') => {
                self.advance();
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(c @ '0'..='7') => {
                            value = value * 8 + (c as u32 - '0' as u32);
                            self.advance();
                        }
                        _ => break,
                    }
                }
                value
            }
            Some('1'..='9') => {
                let decimal = self.parse_decimal()?;
                u32::try_from(decimal).map_err(|_| {
                    GenError::syntax(start, format!("Code point {} is out of range", decimal))
                })?
            }
            _ => return Err(self.error("Invalid escape character")),
        };
        char::from_u32(value)
            .ok_or_else(|| GenError::syntax(start, format!("Invalid code point {:#x}", value)))
    }

    fn parse_hex(&mut self, digits: usize) -> Result<u32, GenError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(format!("Expected {} hex digits", digits)))?;
            value = value * 16 + digit;
            self.advance();
        }
        Ok(value)
    }

    fn parse_decimal(&mut self) -> Result<usize, GenError> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        s.parse::<usize>()
            .map_err(|e| GenError::syntax(start, format!("Invalid number '{}': {}", s, e)))
    }

    /// Parse a group name in the form `<name>` or `'name'`.
    fn parse_group_name(&mut self) -> Result<String, GenError> {
        let close = match self.advance() {
            Some('<') => '>',
            Some('\'') => '\'',
            _ => return Err(self.error("Group name must begin with ' or <")),
        };
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.error("Invalid characters in group name")),
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        self.expect(close)?;
        Ok(name)
    }

    /// Numbered groups resolve first, then named groups continue the numbering.
    fn group_by_number(&self, number: usize) -> Option<NodeId> {
        if let Some((_, id)) = self.ctx.indexed_groups.iter().find(|(n, _)| *n == number) {
            return Some(*id);
        }
        let offset = number.checked_sub(self.ctx.group_count + 1)?;
        self.ctx.named_groups.get(offset).copied()
    }

    fn group_by_name(&self, name: &str) -> Option<NodeId> {
        self.ctx.named_groups.iter().copied().find(|id| {
            matches!(self.ctx.ast.kind(*id), NodeKind::Group { name: Some(n), .. } if n == name)
        })
    }

    /// Parse a group: `(...)`, `(?:...)`, `(?<name>...)`, `(?'name'...)`.
    fn parse_group(&mut self) -> Result<NodeId, GenError> {
        let open = self.pos;
        self.advance(); // consume '('

        let mut name = None;
        let mut capturing = true;
        if self.peek() == Some('?') {
            self.advance(); // consume '?'
            match (self.peek(), self.char_at(self.pos + 1)) {
                (Some(':'), _) => {
                    self.advance();
                    capturing = false;
                }
                (Some('=' | '!'), _) | (Some('<'), Some('=' | '!')) => {
                    return Err(self.error("Lookaround is not supported"));
                }
                (Some('<' | '\''), _) => {
                    name = Some(self.parse_group_name()?);
                }
                _ => return Err(self.error("Invalid group syntax after '(?'")),
            }
        }

        let number = if capturing && name.is_none() {
            self.ctx.group_count += 1;
            Some(self.ctx.group_count)
        } else {
            None
        };

        let child = self.parse_alternation()?;
        if self.peek() != Some(')') {
            return Err(GenError::syntax(open, "Unmatched '(': expected ')'"));
        }
        self.advance();

        let named = name.is_some();
        let id = self.push(NodeKind::Group {
            child,
            name,
            capture: number,
        });
        if let Some(number) = number {
            self.ctx.indexed_groups.push((number, id));
        } else if named {
            self.ctx.named_groups.push(id);
        }
        Ok(id)
    }

    /// Parse `[:name:]` and compile its expansion in the shared context.
    fn parse_macro(&mut self) -> Result<NodeId, GenError> {
        let start = self.pos;
        self.pos += 2; // consume '[:'
        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.advance();
        }
        if self.peek() != Some(':') || self.char_at(self.pos + 1) != Some(']') {
            return Err(GenError::syntax(start, "Cannot parse macro"));
        }
        let name: String = self.chars[name_start..self.pos].iter().collect();
        self.pos += 2; // consume ':]'

        let expanded = posix::expand(&name)
            .ok_or_else(|| GenError::syntax(start, format!("Unknown macro [:{}:]", name)))?;
        Parser::new(expanded, &mut *self.ctx)
            .parse()
            .map_err(|_| GenError::syntax(start, format!("Cannot expand macro [:{}:]", name)))
    }

    /// Parse a character class: `[abc]`, `[a-z]`, `[^abc]`.
    fn parse_char_class(&mut self) -> Result<NodeId, GenError> {
        let open = self.pos;
        self.advance(); // consume '['
        let positive = if self.peek() == Some('^') {
            self.advance();
            false
        } else {
            true
        };
        let mut set = CharSet::new(positive);

        // ']' and '-' need no escape as the first member
        if let Some(c @ (']' | '-')) = self.peek() {
            self.advance();
            set.add_char(c);
        }

        loop {
            match self.peek() {
                None => return Err(GenError::syntax(open, "Unterminated character class")),
                Some(']') => break,
                Some(_) => {}
            }
            match self.parse_class_item()? {
                ClassItem::Shorthand(kind) => set.add_shorthand(kind),
                ClassItem::Char(first) => {
                    let is_range = self.peek() == Some('-')
                        && !matches!(self.char_at(self.pos + 1), None | Some(']'));
                    if is_range {
                        self.advance(); // consume '-'
                        let range_pos = self.pos;
                        let last = match self.parse_class_item()? {
                            ClassItem::Char(c) => c,
                            ClassItem::Shorthand(_) => {
                                return Err(GenError::syntax(range_pos, "Invalid range end"));
                            }
                        };
                        if first > last {
                            return Err(GenError::syntax(
                                range_pos,
                                "Invalid range specified in char set",
                            ));
                        }
                        set.add_range(first, last);
                    } else {
                        set.add_char(first);
                    }
                }
            }
        }
        self.advance(); // consume ']'
        Ok(self.push(NodeKind::Set(set)))
    }

    /// Parse one member of a set, resolving escapes.
    fn parse_class_item(&mut self) -> Result<ClassItem, GenError> {
        let start = self.pos;
        let ch = match self.advance() {
            None => return Err(self.error("Unterminated character class")),
            Some('-') if self.peek() == Some(']') => '-',
            Some('-') => return Err(GenError::syntax(start, "Invalid character inside set")),
            Some('\\') => match self.peek() {
                None => return Err(self.error("Unexpected end in character class escape")),
                Some('x' | 'u' | '0'..='9') => self.parse_escape_value()?,
                Some(c) => {
                    if let Some(kind) = Shorthand::from_escape(c) {
                        self.advance();
                        return Ok(ClassItem::Shorthand(kind));
                    }
                    let literal = match c {
                        'r' => '\r',
                        'n' => '\n',
                        't' => '\t',
                        'f' => '\x0C',
                        'v' => '\x0B',
                        'a' => '\x07',
                        'b' => '\x08',
                        'e' => '\x1B',
                        c if c.is_ascii_punctuation() || c == ' ' => c,
                        _ => return Err(self.error("Invalid escape inside of set")),
                    };
                    self.advance();
                    literal
                }
            },
            Some(c) => c,
        };
        if ch > MAX_SET_CHAR {
            return Err(GenError::syntax(start, "Character outside the 16-bit range"));
        }
        Ok(ClassItem::Char(ch))
    }
}
