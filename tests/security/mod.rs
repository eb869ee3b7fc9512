//! Security module tests.

mod principal_test;
