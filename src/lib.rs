//! Inspecting RPKI objects.
//!
//! The _Resource Public Key Infrastructure_ (RPKI) is an application of
//! PKI to Internet routing security. It allows owners of IP address prefixes
//! to publish cryptographically signed associations of their prefixes to
//! autonomous systems, allowing the validation of the origin of a route
//! announcement in BGP.
//!
//! This crate decodes published ROAs and manifests for offline inspection.
//! It finds the ROAs in a repository tree that cover a given prefix and
//! produces human-readable reports on manifests. Signatures, certificates,
//! and CRLs are never validated: everything here works on the decoded but
//! unverified content of the objects.
//!
//! The crate ships with two command line tools built on top of it:
//! `findroa` searches a tree for covering ROAs and `printmft` prints
//! manifests.

pub mod error;
pub mod logging;
pub mod manifest;
pub mod oid;
pub mod prefix;
pub mod report;
pub mod roa;
pub mod sigobj;
pub mod walk;
pub mod x509;

mod util;
