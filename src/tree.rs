//! Directory tree representation and rendering.
//!
//! Builds a nested node structure from the collected relative paths and
//! renders it with box-drawing connectors. Paths arrive `/`-normalized, so
//! rendering is identical across platforms for identical input.

use std::cmp::Ordering;

/// A node in the rendered tree: directories are internal nodes, files are
/// leaves.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub name: String,
    is_dir: bool,
    children: Vec<FileNode>,
}

impl FileNode {
    /// Create a directory node.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            children: Vec::new(),
        }
    }

    /// Create a file (leaf) node.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.is_dir
    }

    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Count leaves under this node.
    pub fn file_count(&self) -> usize {
        if self.is_dir {
            self.children.iter().map(|c| c.file_count()).sum()
        } else {
            1
        }
    }

    /// Insert one `/`-separated relative path, creating intermediate
    /// directory nodes as needed.
    pub fn insert(&mut self, relative: &str) {
        let mut node = self;
        let components: Vec<&str> = relative.split('/').filter(|c| !c.is_empty()).collect();
        let Some((file_name, dirs)) = components.split_last() else {
            return;
        };

        for dir in dirs {
            let position = node
                .children
                .iter()
                .position(|c| c.is_dir && c.name == *dir);
            let index = match position {
                Some(i) => i,
                None => {
                    node.children.push(FileNode::directory(*dir));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        if !node.children.iter().any(|c| !c.is_dir && c.name == *file_name) {
            node.children.push(FileNode::file(*file_name));
        }
    }

    /// Sort children: directories first, then files, bytewise by name at
    /// each level. Bytewise (not case-folded) keeps ties impossible and the
    /// order reproducible.
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| match (a.is_dir, b.is_dir) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });
        for child in &mut self.children {
            child.sort_children();
        }
    }
}

/// Build a sorted tree from collected relative paths.
pub fn build_tree<'a>(root_name: &str, relative_paths: impl IntoIterator<Item = &'a str>) -> FileNode {
    let mut root = FileNode::directory(root_name);
    for path in relative_paths {
        root.insert(path);
    }
    root.sort_children();
    root
}

// Box-drawing connectors; the last child of a directory gets the terminal
// form.
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render a tree to text. The root renders as a bare name line; children
/// follow with connectors.
///
/// # Examples
///
/// ```
/// use marrow::tree::{build_tree, render_tree};
///
/// let tree = build_tree("project", ["src/app.py", "main.py"]);
/// let text = render_tree(&tree);
/// assert!(text.starts_with("project\n"));
/// assert!(text.contains("└── main.py"));
/// ```
pub fn render_tree(root: &FileNode) -> String {
    let mut output = String::with_capacity(1024);
    output.push_str(&root.name);
    output.push('\n');
    render_children(&mut output, root, "");
    output
}

fn render_children(output: &mut String, node: &FileNode, prefix: &str) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == count - 1;
        output.push_str(prefix);
        output.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        output.push_str(&child.name);
        output.push('\n');

        if child.is_dir {
            let continuation = if is_last { SPACE } else { VERTICAL };
            let child_prefix = format!("{prefix}{continuation}");
            render_children(output, child, &child_prefix);
        }
    }
}
