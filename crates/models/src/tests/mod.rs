/// CRUD and ownership-scoping tests against a live database
pub mod crud_tests;
