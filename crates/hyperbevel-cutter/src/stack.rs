//! A host modifier stack model: naming, prefixes, sorting and block moves.
//!
//! Names carry an ordering hint as a prefix. `- ` glues a modifier to the
//! one after it, `+ ` glues it to the one before it. `* ` and `** ` are
//! informational and only stripped when computing base names.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Modifier type as far as sorting cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifierKind {
    /// Boolean against another object.
    Boolean,
    /// Bevel.
    Bevel,
    /// Merge by distance.
    Weld,
    /// Subdivision surface.
    Subsurf,
    /// Displace.
    Displace,
    /// Solidify.
    Solidify,
    /// Mirror.
    Mirror,
    /// Array.
    Array,
    /// Curve deform.
    Curve,
    /// Hook.
    Hook,
    /// Node group modifier. Sources, auto smooth and hyper arrays are these.
    Nodes,
    /// Anything else.
    Other,
}

/// One entry of a host stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Unique name, possibly prefixed.
    pub name: String,
    /// Modifier type.
    pub kind: ModifierKind,
    /// Node group name for [`ModifierKind::Nodes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_group: Option<String>,
    /// Pinned to the end of the stack.
    #[serde(default)]
    pub pinned: bool,
    /// Evaluated in the viewport.
    #[serde(default = "default_true")]
    pub show_viewport: bool,
}

fn default_true() -> bool {
    true
}

impl Modifier {
    /// A visible, unpinned modifier.
    pub fn new(name: impl Into<String>, kind: ModifierKind) -> Self {
        Self {
            name: name.into(),
            kind,
            node_group: None,
            pinned: false,
            show_viewport: true,
        }
    }

    /// A node group modifier.
    pub fn nodes(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            node_group: Some(group.into()),
            ..Self::new(name, ModifierKind::Nodes)
        }
    }

    /// Ordering prefix of the name, if any.
    pub fn prefix(&self) -> Option<Prefix> {
        Prefix::of(&self.name)
    }

    /// Name without ordering prefixes.
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }

    fn group_starts_with(&self, patterns: &[&str]) -> bool {
        self.kind == ModifierKind::Nodes
            && self
                .node_group
                .as_deref()
                .is_some_and(|g| patterns.iter().any(|p| g.starts_with(p)))
    }

    fn category(&self) -> Category {
        if self.pinned {
            return Category::Pinned;
        }
        match self.kind {
            ModifierKind::Hook => Category::Hook,
            ModifierKind::Bevel if self.name.contains("Edge Bevel") => Category::EdgeBevel,
            ModifierKind::Subsurf => Category::Subsurf,
            ModifierKind::Displace => Category::Displace,
            ModifierKind::Solidify => Category::Solidify,
            ModifierKind::Boolean if !["Hyper Cut", "Hyper Bevel"].iter().any(|n| self.name.contains(n)) => {
                Category::Boolean
            }
            ModifierKind::Mirror => Category::Mirror,
            ModifierKind::Array => Category::Array,
            ModifierKind::Curve => Category::Curve,
            ModifierKind::Nodes if self.group_starts_with(&["Hyper Source"]) => Category::Source,
            ModifierKind::Nodes if self.group_starts_with(&["Smooth by Angle", "Auto Smooth"]) => {
                Category::AutoSmooth
            }
            ModifierKind::Nodes if self.group_starts_with(&["Linear Hyper Array", "Radial Hyper Array"]) => {
                Category::Array
            }
            _ => Category::Main,
        }
    }
}

/// Sort buckets, in stack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    Source,
    Hook,
    EdgeBevel,
    Subsurf,
    Displace,
    Solidify,
    Main,
    Boolean,
    AutoSmooth,
    Mirror,
    Array,
    Curve,
    Pinned,
}

/// Ordering prefix of a modifier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefix {
    /// `+ `: stays after its predecessor.
    Plus,
    /// `- `: stays before its successor.
    Minus,
    /// `* `: informational.
    Star,
    /// `** `: informational.
    DoubleStar,
}

impl Prefix {
    /// The prefix without its trailing space.
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Plus => "+",
            Prefix::Minus => "-",
            Prefix::Star => "*",
            Prefix::DoubleStar => "**",
        }
    }

    /// Leading prefix of `name`.
    pub fn of(name: &str) -> Option<Prefix> {
        if name.starts_with("+ ") {
            Some(Prefix::Plus)
        } else if name.starts_with("- ") {
            Some(Prefix::Minus)
        } else if name.starts_with("* ") {
            Some(Prefix::Star)
        } else if name.starts_with("** ") {
            Some(Prefix::DoubleStar)
        } else {
            None
        }
    }

    /// `"<prefix> <base name>"`.
    pub fn apply(self, name: &str) -> String {
        format!("{} {}", self.as_str(), base_name(name))
    }
}

/// Name without any ordering prefixes.
pub fn base_name(name: &str) -> &str {
    let mut rest = name;
    while let Some(stripped) = ["- ", "+ ", "** ", "* "].iter().find_map(|p| rest.strip_prefix(p)) {
        rest = stripped;
    }
    rest
}

/// Numeric `.NNN` suffix of a name, 0 without one.
fn name_index(name: &str) -> u32 {
    base_name(name)
        .rsplit_once('.')
        .and_then(|(_, suffix)| {
            if suffix.len() >= 3 && suffix.bytes().all(|b| b.is_ascii_digit()) {
                suffix.parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Direction of a block move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackDirection {
    /// Towards index 0.
    Up,
    /// Away from index 0.
    Down,
}

/// An ordered modifier stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierStack {
    mods: Vec<Modifier>,
}

impl From<Vec<Modifier>> for ModifierStack {
    fn from(mods: Vec<Modifier>) -> Self {
        Self { mods }
    }
}

impl ModifierStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of modifiers.
    pub fn len(&self) -> usize {
        self.mods.len()
    }

    /// No modifiers at all.
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Modifiers in stack order.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.mods.iter()
    }

    /// Names in stack order.
    pub fn names(&self) -> Vec<&str> {
        self.mods.iter().map(|m| m.name.as_str()).collect()
    }

    /// Position of the modifier called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.mods.iter().position(|m| m.name == name)
    }

    /// Modifier by name.
    pub fn get(&self, name: &str) -> Option<&Modifier> {
        self.mods.iter().find(|m| m.name == name)
    }

    /// Mutable modifier by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Modifier> {
        self.mods.iter_mut().find(|m| m.name == name)
    }

    /// Append to the end.
    pub fn push(&mut self, modifier: Modifier) {
        self.mods.push(modifier);
    }

    /// Remove by name.
    pub fn remove(&mut self, name: &str) -> Option<Modifier> {
        let idx = self.index_of(name)?;
        Some(self.mods.remove(idx))
    }

    /// Move a modifier to `index`. Out of range indices are ignored.
    pub fn move_to(&mut self, name: &str, index: usize) -> bool {
        let Some(current) = self.index_of(name) else {
            return false;
        };
        if index >= self.mods.len() {
            warn!(name, index, "skipped moving modifier, index out of range");
            return false;
        }
        if current != index {
            let m = self.mods.remove(current);
            self.mods.insert(index, m);
        }
        true
    }

    /// Rename in place. Returns the new name.
    pub fn rename(&mut self, name: &str, new_name: impl Into<String>) -> Option<String> {
        let m = self.get_mut(name)?;
        m.name = new_name.into();
        Some(m.name.clone())
    }

    /// A free name for a new modifier with base name `base`: `base` when no
    /// existing name contains it, else `base.NNN` above the largest index.
    pub fn new_mod_name(&self, base: &str) -> String {
        let max = self
            .mods
            .iter()
            .filter(|m| m.name.contains(base))
            .map(|m| name_index(&m.name))
            .max();
        match max {
            None => base.to_string(),
            Some(idx) => format!("{base}.{:03}", idx + 1),
        }
    }

    /// Place a modifier right after the last `Split` boolean, past any
    /// `+ `-prefixed followers, and glue it there with `+ `. Returns its new
    /// name and index, or `None` without a split.
    pub fn sort_after_split(&mut self, name: &str) -> Option<(String, usize)> {
        let split = self
            .mods
            .iter()
            .rposition(|m| m.name != name && m.kind == ModifierKind::Boolean && m.name.contains("Split"))?;
        self.index_of(name)?;

        let mut next = split + 1;
        while next < self.mods.len() && self.mods[next].prefix() == Some(Prefix::Plus) {
            next += 1;
        }
        self.move_to(name, next);
        let renamed = self.rename(name, format!("+ {name}"))?;
        let idx = self.index_of(&renamed)?;
        Some((renamed, idx))
    }

    /// Resolve `- ` directly followed by `+ ` and dangling prefixes at either
    /// end. Returns false if the names never settle.
    pub fn validate_prefixes(&mut self) -> bool {
        if self.mods.is_empty() {
            return true;
        }
        for _ in 0..1000 {
            let mut illegal = false;
            for idx in 0..self.mods.len() - 1 {
                if self.mods[idx].prefix() == Some(Prefix::Minus) && self.mods[idx + 1].prefix() == Some(Prefix::Plus) {
                    illegal = true;
                    let base = base_name(&self.mods[idx].name).to_string();
                    self.mods[idx].name = if idx == 0 { base } else { format!("+ {base}") };
                }
            }
            if self.mods[0].prefix() == Some(Prefix::Plus) {
                self.mods[0].name = base_name(&self.mods[0].name).to_string();
            }
            let last = self.mods.len() - 1;
            if self.mods[last].prefix() == Some(Prefix::Minus) {
                self.mods[last].name = base_name(&self.mods[last].name).to_string();
            }
            if !illegal {
                return true;
            }
        }
        false
    }

    /// Stable sort by category, then re-glue prefixed modifiers to their
    /// original neighbours. Returns false and leaves the stack alone if the
    /// prefixes cannot be validated.
    pub fn sort(&mut self) -> bool {
        if self.mods.is_empty() {
            return true;
        }
        if !self.validate_prefixes() {
            warn!("could not sort modifiers, unresolvable prefixes");
            return false;
        }

        let n = self.mods.len();
        let mut keyed: Vec<(Category, usize)> = Vec::with_capacity(n);
        let mut minus = Vec::new();
        let mut plus = Vec::new();
        for (idx, m) in self.mods.iter().enumerate() {
            match m.prefix() {
                _ if m.pinned => keyed.push((Category::Pinned, idx)),
                Some(Prefix::Minus) if idx + 1 < n => minus.push((idx, idx + 1)),
                Some(Prefix::Plus) if idx > 0 => plus.push((idx, idx - 1)),
                _ => keyed.push((m.category(), idx)),
            }
        }
        keyed.sort_by_key(|&(category, _)| category);
        let mut order: Vec<usize> = keyed.into_iter().map(|(_, idx)| idx).collect();

        for &(idx, next) in minus.iter().rev() {
            match order.iter().position(|&o| o == next) {
                Some(pos) => order.insert(pos, idx),
                None => order.push(idx),
            }
        }
        for &(idx, prev) in &plus {
            match order.iter().position(|&o| o == prev) {
                Some(pos) => order.insert(pos + 1, idx),
                None => order.push(idx),
            }
        }

        let mut slots: Vec<Option<Modifier>> = std::mem::take(&mut self.mods).into_iter().map(Some).collect();
        self.mods = order.into_iter().filter_map(|idx| slots[idx].take()).collect();
        true
    }

    /// Move a contiguous block of modifiers one slot and re-prefix it.
    ///
    /// Up takes `- ` unless the modifier after the block is `+ `-prefixed.
    /// Down takes `+ ` unless the modifier before the block is `- `-prefixed.
    /// Returns the block's new names, or `None` if the block is not
    /// contiguous or cannot move further.
    pub fn move_block(&mut self, block: &[String], direction: StackDirection) -> Option<Vec<String>> {
        let first = self.index_of(block.first()?)?;
        let count = block.len();
        let contiguous = block
            .iter()
            .enumerate()
            .all(|(i, name)| self.mods.get(first + i).is_some_and(|m| &m.name == name));
        if !contiguous {
            return None;
        }

        let start = match direction {
            StackDirection::Up if first > 0 => {
                let above = self.mods.remove(first - 1);
                self.mods.insert(first - 1 + count, above);
                first - 1
            }
            StackDirection::Down if first + count < self.mods.len() => {
                let below = self.mods.remove(first + count);
                self.mods.insert(first, below);
                first + 1
            }
            _ => return None,
        };

        let before = start.checked_sub(1).and_then(|i| self.mods.get(i)).and_then(Modifier::prefix);
        let after = self.mods.get(start + count).and_then(Modifier::prefix);
        let prefix = match direction {
            StackDirection::Up if after == Some(Prefix::Plus) => Prefix::Plus,
            StackDirection::Up => Prefix::Minus,
            StackDirection::Down if before == Some(Prefix::Minus) => Prefix::Minus,
            StackDirection::Down => Prefix::Plus,
        };

        let mut names = Vec::with_capacity(count);
        for m in &mut self.mods[start..start + count] {
            m.name = prefix.apply(&m.name);
            names.push(m.name.clone());
        }
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(entries: &[(&str, ModifierKind)]) -> ModifierStack {
        entries.iter().map(|&(n, k)| Modifier::new(n, k)).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_prefixes_and_base_names() {
        assert_eq!(Prefix::of("+ Hyper Bevel"), Some(Prefix::Plus));
        assert_eq!(Prefix::of("- Hyper Bevel"), Some(Prefix::Minus));
        assert_eq!(Prefix::of("* Mirror"), Some(Prefix::Star));
        assert_eq!(Prefix::of("** Mirror"), Some(Prefix::DoubleStar));
        assert_eq!(Prefix::of("Mirror"), None);
        assert_eq!(base_name("+ Hyper Bevel.002"), "Hyper Bevel.002");
        assert_eq!(base_name("** Mirror"), "Mirror");
        assert_eq!(Prefix::Minus.apply("+ Hyper Bevel"), "- Hyper Bevel");
    }

    #[test]
    fn test_new_mod_name() {
        let mut s = ModifierStack::new();
        assert_eq!(s.new_mod_name("Hyper Bevel"), "Hyper Bevel");
        s.push(Modifier::new("Hyper Bevel", ModifierKind::Boolean));
        assert_eq!(s.new_mod_name("Hyper Bevel"), "Hyper Bevel.001");
        s.push(Modifier::new("+ Hyper Bevel.004", ModifierKind::Boolean));
        s.push(Modifier::new("Hyper Cut.009", ModifierKind::Boolean));
        assert_eq!(s.new_mod_name("Hyper Bevel"), "Hyper Bevel.005");
    }

    #[test]
    fn test_sort_after_split() {
        let mut s = stack(&[
            ("Split", ModifierKind::Boolean),
            ("+ Hyper Cut", ModifierKind::Boolean),
            ("Mirror", ModifierKind::Mirror),
            ("Hyper Bevel", ModifierKind::Boolean),
        ]);
        let (name, idx) = s.sort_after_split("Hyper Bevel").unwrap();
        assert_eq!(name, "+ Hyper Bevel");
        assert_eq!(idx, 2);
        assert_eq!(s.names(), ["Split", "+ Hyper Cut", "+ Hyper Bevel", "Mirror"]);

        let mut plain = stack(&[("Mirror", ModifierKind::Mirror), ("Hyper Bevel", ModifierKind::Boolean)]);
        assert!(plain.sort_after_split("Hyper Bevel").is_none());
    }

    #[test]
    fn test_sort_by_category() {
        let mut s = stack(&[
            ("Mirror", ModifierKind::Mirror),
            ("Boolean", ModifierKind::Boolean),
            ("Hyper Bevel", ModifierKind::Boolean),
            ("Subdivision", ModifierKind::Subsurf),
            ("Edge Bevel", ModifierKind::Bevel),
            ("Weld", ModifierKind::Weld),
            ("Hook", ModifierKind::Hook),
        ]);
        s.push(Modifier::nodes("Source", "Hyper Source"));
        s.push(Modifier::nodes("Smooth", "Smooth by Angle"));

        assert!(s.sort());
        assert_eq!(
            s.names(),
            [
                "Source",
                "Hook",
                "Edge Bevel",
                "Subdivision",
                "Hyper Bevel",
                "Weld",
                "Boolean",
                "Smooth",
                "Mirror"
            ]
        );
    }

    #[test]
    fn test_sort_keeps_glued_neighbours() {
        let mut s = stack(&[
            ("Boolean", ModifierKind::Boolean),
            ("+ Hyper Bevel", ModifierKind::Boolean),
            ("Mirror", ModifierKind::Mirror),
            ("- Hyper Bevel.001", ModifierKind::Boolean),
            ("Solidify", ModifierKind::Solidify),
        ]);
        assert!(s.sort());
        assert_eq!(
            s.names(),
            ["- Hyper Bevel.001", "Solidify", "Boolean", "+ Hyper Bevel", "Mirror"]
        );
    }

    #[test]
    fn test_validate_prefixes() {
        let mut s = stack(&[
            ("+ First", ModifierKind::Other),
            ("- A", ModifierKind::Other),
            ("+ B", ModifierKind::Other),
            ("- Last", ModifierKind::Other),
        ]);
        assert!(s.validate_prefixes());
        assert_eq!(s.names(), ["First", "+ A", "+ B", "Last"]);
    }

    #[test]
    fn test_move_block() {
        let mut s = stack(&[
            ("Boolean", ModifierKind::Boolean),
            ("Hyper Bevel", ModifierKind::Boolean),
            ("Hyper Bevel.001", ModifierKind::Boolean),
            ("Mirror", ModifierKind::Mirror),
        ]);
        let block = vec!["Hyper Bevel".to_string(), "Hyper Bevel.001".to_string()];

        let up = s.move_block(&block, StackDirection::Up).unwrap();
        assert_eq!(up, ["- Hyper Bevel", "- Hyper Bevel.001"]);
        assert_eq!(s.names(), ["- Hyper Bevel", "- Hyper Bevel.001", "Boolean", "Mirror"]);
        assert!(s.move_block(&up, StackDirection::Up).is_none());

        let down = s.move_block(&up, StackDirection::Down).unwrap();
        assert_eq!(down, ["+ Hyper Bevel", "+ Hyper Bevel.001"]);
        let down = s.move_block(&down, StackDirection::Down).unwrap();
        assert_eq!(s.names(), ["Boolean", "Mirror", "+ Hyper Bevel", "+ Hyper Bevel.001"]);
        assert!(s.move_block(&down, StackDirection::Down).is_none());
    }

    #[test]
    fn test_move_block_respects_neighbour_glue() {
        let mut s = stack(&[
            ("Boolean", ModifierKind::Boolean),
            ("+ Weld", ModifierKind::Weld),
            ("Hyper Bevel", ModifierKind::Boolean),
            ("Mirror", ModifierKind::Mirror),
        ]);
        let names = s.move_block(&["Hyper Bevel".to_string()], StackDirection::Up).unwrap();
        assert_eq!(names, ["+ Hyper Bevel"]);
        assert_eq!(s.names(), ["Boolean", "+ Hyper Bevel", "+ Weld", "Mirror"]);

        let mut s = stack(&[
            ("Boolean", ModifierKind::Boolean),
            ("- Solidify", ModifierKind::Solidify),
            ("Hyper Bevel", ModifierKind::Boolean),
            ("Mirror", ModifierKind::Mirror),
            ("+ Array", ModifierKind::Array),
        ]);
        let names = s.move_block(&["Hyper Bevel".to_string()], StackDirection::Up).unwrap();
        assert_eq!(s.names(), ["Boolean", "- Hyper Bevel", "- Solidify", "Mirror", "+ Array"]);
        assert_eq!(names, ["- Hyper Bevel"]);
        let names = s.move_block(&names, StackDirection::Down).unwrap();
        assert_eq!(names, ["- Hyper Bevel"]);
        assert_eq!(s.names(), ["Boolean", "- Solidify", "- Hyper Bevel", "Mirror", "+ Array"]);
    }
}
