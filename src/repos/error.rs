/*
 * Responsibility
 * - What the repo layer reports upward
 */
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("conflict")]
    Conflict,
}
