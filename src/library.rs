//! Tree of file-system entries with enqueued flags, addressed by arena
//! index rather than the original's parent/child pointers.
//!
//! Grounded on `src/directorytree.c`'s `FileSystemEntry` in the original
//! source; REDESIGN FLAGS (spec.md §9) call out this tree specifically as
//! cycle-prone in its raw-pointer form, so `LibraryId` + `Vec<LibraryEntry>`
//! replaces `parent`/`children`/`next_sibling` pointers with indices.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryId(pub u32);

#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub id: LibraryId,
    pub name: String,
    pub is_directory: bool,
    pub is_enqueued: bool,
    pub parent: Option<LibraryId>,
    pub children: Vec<LibraryId>,
}

/// Arena-backed tree. `full_path` is derived on demand by walking `parent`
/// links rather than stored per-node, so renames and re-parenting (neither
/// of which the core performs today) can't desync it.
pub struct Library {
    nodes: Vec<LibraryEntry>,
    roots: Vec<LibraryId>,
    by_path: HashMap<String, LibraryId>,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    fn idx(&self, id: LibraryId) -> usize {
        id.0 as usize
    }

    pub fn get(&self, id: LibraryId) -> Option<&LibraryEntry> {
        self.nodes.get(self.idx(id))
    }

    pub fn get_mut(&mut self, id: LibraryId) -> Option<&mut LibraryEntry> {
        let idx = self.idx(id);
        self.nodes.get_mut(idx)
    }

    pub fn roots(&self) -> &[LibraryId] {
        &self.roots
    }

    /// Inserts a new entry under `parent` (or as a root if `None`),
    /// returning its freshly-assigned id.
    pub fn insert(&mut self, name: impl Into<String>, is_directory: bool, parent: Option<LibraryId>) -> LibraryId {
        let id = LibraryId(self.nodes.len() as u32);
        let name = name.into();
        self.nodes.push(LibraryEntry {
            id,
            name,
            is_directory,
            is_enqueued: false,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(p) => {
                let idx = self.idx(p);
                self.nodes[idx].children.push(id);
            }
            None => self.roots.push(id),
        }

        let path = self.full_path(id);
        self.by_path.insert(path, id);
        id
    }

    /// Ancestor names joined by `/`, from a root down to `id`.
    pub fn full_path(&self, id: LibraryId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let entry = &self.nodes[self.idx(c)];
            parts.push(entry.name.clone());
            cur = entry.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    pub fn find_by_path(&self, path: &str) -> Option<LibraryId> {
        self.by_path.get(path).copied()
    }

    /// Sets `is_enqueued` on `id` and propagates to ancestors: a directory's
    /// flag is true iff any descendant file is enqueued, so clearing a leaf
    /// can only clear an ancestor if no sibling subtree still holds the
    /// flag, which is why ancestors are recomputed from their children
    /// rather than blindly copying `enqueued` upward.
    pub fn set_enqueued(&mut self, id: LibraryId, enqueued: bool) {
        if let Some(entry) = self.get_mut(id) {
            entry.is_enqueued = enqueued;
        }
        let mut cur = self.get(id).and_then(|e| e.parent);
        while let Some(p) = cur {
            let any_child_enqueued = self.nodes[self.idx(p)]
                .children
                .iter()
                .any(|c| self.nodes[self.idx(*c)].is_enqueued);
            self.nodes[self.idx(p)].is_enqueued = any_child_enqueued;
            cur = self.nodes[self.idx(p)].parent;
        }
    }

    fn descendants(&self, id: LibraryId) -> Vec<LibraryId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            for child in &self.nodes[self.idx(cur)].children {
                out.push(*child);
                stack.push(*child);
            }
        }
        out
    }

    /// Checks the invariant spec.md §8 names: a directory's `is_enqueued`
    /// equals "any descendant file is enqueued".
    pub fn check_enqueued_invariant(&self, id: LibraryId) -> bool {
        let entry = match self.get(id) {
            Some(e) => e,
            None => return true,
        };
        if !entry.is_directory {
            return true;
        }
        let expected = self
            .descendants(id)
            .iter()
            .filter(|d| !self.nodes[self.idx(**d)].is_directory)
            .any(|d| self.nodes[self.idx(*d)].is_enqueued);
        entry.is_enqueued == expected
    }

    /// Serialises to the tab-separated cache format: one line per node,
    /// `id\tname\tis_directory(0|1)\tparent_id` (`-1` for roots). Names
    /// must not contain `\t`/`\n`; callers are expected to have rejected
    /// such names at insert time, so this just writes them verbatim.
    pub fn serialize_tsv(&self) -> String {
        let mut out = String::new();
        for entry in &self.nodes {
            let parent_id = entry.parent.map(|p| p.0 as i64).unwrap_or(-1);
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                entry.id.0,
                entry.name,
                if entry.is_directory { 1 } else { 0 },
                parent_id
            ));
        }
        out
    }

    /// Rebuilds a `Library` from the tab-separated cache format. Order of
    /// lines is irrelevant; parent links are resolved by id once every
    /// record has been read, so forward references are fine.
    pub fn deserialize_tsv(data: &str) -> Result<Library, String> {
        struct Raw {
            id: u32,
            name: String,
            is_directory: bool,
            parent_id: i64,
        }

        let mut raws = Vec::new();
        for (line_no, line) in data.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let id: u32 = fields
                .next()
                .ok_or_else(|| format!("line {line_no}: missing id"))?
                .parse()
                .map_err(|e| format!("line {line_no}: bad id: {e}"))?;
            let name = fields
                .next()
                .ok_or_else(|| format!("line {line_no}: missing name"))?
                .to_string();
            let is_directory = fields
                .next()
                .ok_or_else(|| format!("line {line_no}: missing is_directory"))?
                == "1";
            let parent_id: i64 = fields
                .next()
                .ok_or_else(|| format!("line {line_no}: missing parent_id"))?
                .parse()
                .map_err(|e| format!("line {line_no}: bad parent_id: {e}"))?;
            raws.push(Raw {
                id,
                name,
                is_directory,
                parent_id,
            });
        }

        raws.sort_by_key(|r| r.id);

        let mut library = Library::new();
        library.nodes = raws
            .iter()
            .map(|r| LibraryEntry {
                id: LibraryId(r.id),
                name: r.name.clone(),
                is_directory: r.is_directory,
                is_enqueued: false,
                parent: if r.parent_id < 0 {
                    None
                } else {
                    Some(LibraryId(r.parent_id as u32))
                },
                children: Vec::new(),
            })
            .collect();

        for raw in &raws {
            match raw.parent_id {
                p if p < 0 => library.roots.push(LibraryId(raw.id)),
                p => {
                    let parent_idx = p as usize;
                    if let Some(parent) = library.nodes.get_mut(parent_idx) {
                        parent.children.push(LibraryId(raw.id));
                    }
                }
            }
        }

        for entry in &library.nodes {
            let path = library.full_path(entry.id);
            library.by_path.insert(path, entry.id);
        }

        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Library, LibraryId, LibraryId, LibraryId) {
        let mut lib = Library::new();
        let root = lib.insert("music", true, None);
        let artist = lib.insert("artist", true, Some(root));
        let song = lib.insert("song.mp3", false, Some(artist));
        (lib, root, artist, song)
    }

    #[test]
    fn full_path_joins_ancestor_names() {
        let (lib, _root, _artist, song) = sample();
        assert_eq!(lib.full_path(song), "music/artist/song.mp3");
    }

    #[test]
    fn enqueue_propagates_to_ancestors() {
        let (mut lib, root, artist, song) = sample();
        lib.set_enqueued(song, true);
        assert!(lib.get(artist).unwrap().is_enqueued);
        assert!(lib.get(root).unwrap().is_enqueued);
        assert!(lib.check_enqueued_invariant(root));

        lib.set_enqueued(song, false);
        assert!(!lib.get(artist).unwrap().is_enqueued);
        assert!(!lib.get(root).unwrap().is_enqueued);
    }

    #[test]
    fn tsv_round_trip_is_byte_identical() {
        let (mut lib, _root, _artist, song) = sample();
        lib.set_enqueued(song, true);
        let first = lib.serialize_tsv();
        let reloaded = Library::deserialize_tsv(&first).unwrap();
        let second = reloaded.serialize_tsv();
        assert_eq!(first, second);
    }

    #[test]
    fn parent_id_negative_one_means_root() {
        let tsv = "0\tmusic\t1\t-1\n1\tsong.mp3\t0\t0\n";
        let lib = Library::deserialize_tsv(tsv).unwrap();
        assert_eq!(lib.roots(), &[LibraryId(0)]);
        assert_eq!(lib.full_path(LibraryId(1)), "music/song.mp3");
    }
}
