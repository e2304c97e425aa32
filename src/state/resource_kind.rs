/// Resource and sub-resource kinds for the mirrored ID spaces
use std::fmt;

/// An independent numeric ID space with its own cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Threads, dynamics and articles at `{base}/{id}.html`
    Post,

    /// Author profiles at `{base}/author/{id}`
    Author,

    /// Author info-cards fetched from the card stencil endpoint
    AuthorCard,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Post, Self::Author, Self::AuthorCard];

    /// Directory under the output root holding this kind's resources
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Post => "Posts",
            Self::Author => "Authors",
            Self::AuthorCard => "AuthorCards",
        }
    }

    /// Cursor file name inside the state directory
    pub fn cursor_file(&self) -> &'static str {
        match self {
            Self::Post => "post.txt",
            Self::Author => "author.txt",
            Self::AuthorCard => "author_cards.txt",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Post => "post",
            Self::Author => "author",
            Self::AuthorCard => "author card",
        };
        write!(f, "{}", s)
    }
}

/// Paginated content nested under a primary resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubresourceKind {
    /// Discussion-thread replies
    ThreadComments,

    /// Comments under a dynamic or article
    DynamicComments,

    /// An author's own posts beyond the first page
    Dynamics,

    /// Posts an author reposted
    Forwards,

    /// Posts an author liked
    Likes,

    /// Accounts an author follows
    Following,

    /// Accounts following an author
    Fans,
}

impl fmt::Display for SubresourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ThreadComments => "thread comments",
            Self::DynamicComments => "comments",
            Self::Dynamics => "dynamics",
            Self::Forwards => "forwards",
            Self::Likes => "likes",
            Self::Following => "following",
            Self::Fans => "fans",
        };
        write!(f, "{}", s)
    }
}
