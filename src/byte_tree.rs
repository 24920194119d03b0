//! Canonical, self-delimiting, length-prefixed binary tree.
//!
//! This is the wire format for everything that crosses the bulletin board and
//! everything written to the transcript directory: leaves carry raw bytes,
//! containers carry an ordered list of children. Encoding is canonical (one
//! tree maps to exactly one byte string) so it can double as the hash input
//! for the random-oracle challenger.
//!
//! The length-prefixed-leaf / length-prefixed-container shape follows the
//! `signing::TranscriptBuilder` pattern, generalized from a flat append-only
//! buffer into an actual tree so it can be read back lazily via [`Reader`].

use thiserror::Error;

const LEAF_TAG: u8 = 0;
const NODE_TAG: u8 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ByteTreeError {
    #[error("unexpected end of input while decoding byte-tree")]
    Truncated,
    #[error("unknown byte-tree tag {0}")]
    UnknownTag(u8),
    #[error("byte-tree node has wrong arity: expected {expected}, got {actual}")]
    WrongArity { expected: usize, actual: usize },
    #[error("expected a leaf node")]
    ExpectedLeaf,
    #[error("expected a container node")]
    ExpectedNode,
    #[error("leaf has wrong length: expected {expected}, got {actual}")]
    WrongLeafLength { expected: usize, actual: usize },
}

/// A canonical byte-tree value: either a length-prefixed leaf or an ordered
/// list of child trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteTree {
    Leaf(Vec<u8>),
    Node(Vec<ByteTree>),
}

impl ByteTree {
    pub fn leaf(bytes: impl Into<Vec<u8>>) -> Self {
        ByteTree::Leaf(bytes.into())
    }

    pub fn node(children: impl Into<Vec<ByteTree>>) -> Self {
        ByteTree::Node(children.into())
    }

    /// Serialize to canonical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            ByteTree::Leaf(bytes) => {
                out.push(LEAF_TAG);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            ByteTree::Node(children) => {
                out.push(NODE_TAG);
                out.extend_from_slice(&(children.len() as u32).to_be_bytes());
                for child in children {
                    child.write(out);
                }
            }
        }
    }

    /// Parse a tree from the front of `bytes`, returning the tree and the
    /// number of bytes consumed.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), ByteTreeError> {
        if bytes.is_empty() {
            return Err(ByteTreeError::Truncated);
        }
        match bytes[0] {
            LEAF_TAG => {
                let len = read_u32(bytes, 1)? as usize;
                let start: usize = 5;
                let end = start
                    .checked_add(len)
                    .ok_or(ByteTreeError::Truncated)?;
                if bytes.len() < end {
                    return Err(ByteTreeError::Truncated);
                }
                Ok((ByteTree::Leaf(bytes[start..end].to_vec()), end))
            }
            NODE_TAG => {
                let count = read_u32(bytes, 1)? as usize;
                let mut offset = 5;
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    let (child, consumed) = ByteTree::parse(&bytes[offset..])?;
                    children.push(child);
                    offset += consumed;
                }
                Ok((ByteTree::Node(children), offset))
            }
            other => Err(ByteTreeError::UnknownTag(other)),
        }
    }

    /// Decode a full buffer, failing if trailing bytes remain.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ByteTreeError> {
        let (tree, consumed) = Self::parse(bytes)?;
        if consumed != bytes.len() {
            return Err(ByteTreeError::Truncated);
        }
        Ok(tree)
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }

    pub fn read_from_file(path: &std::path::Path) -> std::io::Result<Result<Self, ByteTreeError>> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn as_leaf(&self) -> Result<&[u8], ByteTreeError> {
        match self {
            ByteTree::Leaf(bytes) => Ok(bytes),
            ByteTree::Node(_) => Err(ByteTreeError::ExpectedLeaf),
        }
    }

    pub fn as_node(&self) -> Result<&[ByteTree], ByteTreeError> {
        match self {
            ByteTree::Node(children) => Ok(children),
            ByteTree::Leaf(_) => Err(ByteTreeError::ExpectedNode),
        }
    }

    /// A lazy reader over this tree's children, for container nodes.
    pub fn reader(&self) -> Result<Reader<'_>, ByteTreeError> {
        Ok(Reader {
            children: self.as_node()?,
            next: 0,
        })
    }
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, ByteTreeError> {
    let end = at.checked_add(4).ok_or(ByteTreeError::Truncated)?;
    if bytes.len() < end {
        return Err(ByteTreeError::Truncated);
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..end]);
    Ok(u32::from_be_bytes(buf))
}

/// Lazy reader over a container node's children, exposing `next_child`.
pub struct Reader<'a> {
    children: &'a [ByteTree],
    next: usize,
}

impl<'a> Reader<'a> {
    pub fn next_child(&mut self) -> Result<&'a ByteTree, ByteTreeError> {
        let child = self.children.get(self.next).ok_or(ByteTreeError::Truncated)?;
        self.next += 1;
        Ok(child)
    }

    pub fn remaining(&self) -> usize {
        self.children.len() - self.next
    }

    /// No-op in this in-memory rendition; present so callers that model the
    /// reader as an owned resource (e.g. over a file handle) compile
    /// unchanged against a future streaming reader.
    pub fn close(self) {}
}

/// Values with a canonical byte-tree encoding.
pub trait ByteTreeEncode {
    fn to_byte_tree(&self) -> ByteTree;
}

/// Values decodable from a canonical byte-tree, failing with
/// [`ByteTreeError`] on structural or element-validity errors.
pub trait ByteTreeDecode: Sized {
    fn from_byte_tree(tree: &ByteTree) -> Result<Self, ByteTreeError>;
}

impl ByteTreeEncode for u32 {
    fn to_byte_tree(&self) -> ByteTree {
        ByteTree::leaf(self.to_be_bytes().to_vec())
    }
}

impl ByteTreeDecode for u32 {
    fn from_byte_tree(tree: &ByteTree) -> Result<Self, ByteTreeError> {
        let bytes = tree.as_leaf()?;
        if bytes.len() != 4 {
            return Err(ByteTreeError::WrongLeafLength {
                expected: 4,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(buf))
    }
}

impl ByteTreeEncode for bool {
    fn to_byte_tree(&self) -> ByteTree {
        ByteTree::leaf(vec![*self as u8])
    }
}

impl ByteTreeDecode for bool {
    fn from_byte_tree(tree: &ByteTree) -> Result<Self, ByteTreeError> {
        let bytes = tree.as_leaf()?;
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            _ => Err(ByteTreeError::WrongLeafLength {
                expected: 1,
                actual: bytes.len(),
            }),
        }
    }
}

impl<T: ByteTreeEncode> ByteTreeEncode for [T] {
    fn to_byte_tree(&self) -> ByteTree {
        ByteTree::node(self.iter().map(|v| v.to_byte_tree()).collect::<Vec<_>>())
    }
}

impl<T: ByteTreeEncode> ByteTreeEncode for Vec<T> {
    fn to_byte_tree(&self) -> ByteTree {
        self.as_slice().to_byte_tree()
    }
}

impl<T: ByteTreeDecode> ByteTreeDecode for Vec<T> {
    fn from_byte_tree(tree: &ByteTree) -> Result<Self, ByteTreeError> {
        tree.as_node()?.iter().map(T::from_byte_tree).collect()
    }
}
