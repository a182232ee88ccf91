//! # Cadastro
//!
//! User registration, login and email confirmation in front of a managed
//! `cadastro` table. The table is reached through the hosted REST gateway
//! (Supabase / PostgREST) or directly over Postgres.
//!
//! ## CPF
//!
//! Every registration carries a CPF (Brazilian personal tax id). It is
//! validated by [`cpf::is_valid`] and nothing else: 11 ASCII digits after
//! stripping formatting, not all identical, with both mod-11 check digits
//! matching. Only the normalized digits are stored.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id and stored as PHC strings. Login
//! compares through the same library; plain passwords never reach the store.
//!
//! ## Email confirmation
//!
//! When enabled, signup stores the SHA-256 of a random token and queues a
//! link in `email_outbox`. `GET /user/confirm?token=` consumes the token once
//! and redirects back to the frontend login page.

pub mod cadastro;
pub mod cli;
pub mod cpf;
pub mod store;
