//! QR ticket workflow: token issuance, the backfill sweep for paid rows that
//! never got a token, and the presentation contract used by clients.

pub mod backfill;
pub mod issuance;
pub mod presentation;
pub mod token;

pub use backfill::{run_backfill, BackfillReport};
pub use issuance::{IssuanceError, Issued, QrIssuer};
pub use presentation::{
    ClientError, HttpIssuanceClient, IssuanceClient, QrArtifact, QrDisplay, QrLinks, QrPresenter,
    QrState,
};
pub use token::{PgTokenGenerator, RandomTokenGenerator, TokenError, TokenGenerator};
