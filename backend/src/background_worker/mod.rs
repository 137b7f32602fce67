pub mod revocation_purge;
