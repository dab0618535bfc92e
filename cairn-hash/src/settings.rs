// Copyright (c) 2022 MASSA LABS <info@massa.net>
/// Size of a SHA-256 digest in bytes
pub const HASH_SIZE_BYTES: usize = 32;
