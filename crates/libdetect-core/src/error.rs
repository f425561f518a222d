pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building or matching a [`crate::tree::PackageTree`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("class name {0:?} does not start with 'L'")]
    InvalidClassName(String),

    #[error("class name {0:?} is exactly 'L', which is not a valid class descriptor")]
    BareRootClassName(String),

    #[error("duplicate class name {0:?} within a single dex")]
    DuplicateClassName(String),

    #[error("class name {0:?} is both a class and an ancestor package of another class")]
    ClassNameIsPackagePrefix(String),
}
