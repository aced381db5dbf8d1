use thiserror::Error;

use crate::model::CatalogError;
use crate::model::SectionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Section(#[from] SectionError),
}
