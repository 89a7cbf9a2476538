use serde::{Deserialize, Serialize};

/// Node types in the code graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Class,
    Function,
    Module,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Function => "function",
            NodeKind::Module => "module",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(NodeKind::File),
            "class" => Ok(NodeKind::Class),
            "function" => Ok(NodeKind::Function),
            "module" => Ok(NodeKind::Module),
            other => Err(format!("unknown node kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    /// Relative path, `/`-separated
    pub id: String,
    /// File name without directories
    pub name: String,
    /// Same as `id` for scanned files
    pub path: String,
    pub line_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub bases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub parameters: Vec<String>,
    pub is_async: bool,
}

/// External import target, inheritance base, or placeholder for an edge target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub id: String,
    pub name: String,
}

/// A node in the code graph
///
/// Each variant carries only the fields that make sense for its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CodeNode {
    File(FileNode),
    Class(ClassNode),
    Function(FunctionNode),
    Module(ModuleNode),
}

impl CodeNode {
    pub fn file(path: &str, line_count: u32) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        CodeNode::File(FileNode {
            id: path.to_string(),
            name,
            path: path.to_string(),
            line_count,
        })
    }

    pub fn module(name: &str) -> Self {
        CodeNode::Module(ModuleNode {
            id: name.to_string(),
            name: name.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            CodeNode::File(n) => &n.id,
            CodeNode::Class(n) => &n.id,
            CodeNode::Function(n) => &n.id,
            CodeNode::Module(n) => &n.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CodeNode::File(n) => &n.name,
            CodeNode::Class(n) => &n.name,
            CodeNode::Function(n) => &n.name,
            CodeNode::Module(n) => &n.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            CodeNode::File(_) => NodeKind::File,
            CodeNode::Class(_) => NodeKind::Class,
            CodeNode::Function(_) => NodeKind::Function,
            CodeNode::Module(_) => NodeKind::Module,
        }
    }

    /// Path of the file the node lives in (modules have none)
    pub fn file_path(&self) -> Option<&str> {
        match self {
            CodeNode::File(n) => Some(&n.path),
            CodeNode::Class(n) => Some(&n.file_path),
            CodeNode::Function(n) => Some(&n.file_path),
            CodeNode::Module(_) => None,
        }
    }

    /// Inclusive line span for definitions
    pub fn lines(&self) -> Option<(u32, u32)> {
        match self {
            CodeNode::Class(n) => Some((n.line_start, n.line_end)),
            CodeNode::Function(n) => Some((n.line_start, n.line_end)),
            _ => None,
        }
    }

    /// Lines of code
    pub fn loc(&self) -> u32 {
        match self {
            CodeNode::File(n) => n.line_count,
            _ => match self.lines() {
                Some((start, end)) if end >= start => end - start + 1,
                _ => 0,
            },
        }
    }
}

/// Edge types in the code graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Imports,
    Contains,
    Method,
    Inherits,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Imports => "imports",
            EdgeKind::Contains => "contains",
            EdgeKind::Method => "method",
            EdgeKind::Inherits => "inherits",
        }
    }
}

/// A directed relation between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

impl CodeEdge {
    pub fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            source_id: source.to_string(),
            target_id: target.to_string(),
            kind,
        }
    }

    pub fn imports(source: &str, target: &str) -> Self {
        Self::new(source, target, EdgeKind::Imports)
    }

    pub fn contains(source: &str, target: &str) -> Self {
        Self::new(source, target, EdgeKind::Contains)
    }

    pub fn method(source: &str, target: &str) -> Self {
        Self::new(source, target, EdgeKind::Method)
    }

    pub fn inherits(source: &str, target: &str) -> Self {
        Self::new(source, target, EdgeKind::Inherits)
    }
}
