//! Typed domain separators for canonical hashing.
//!
//! Every digest in the workspace selects a domain via [`HashDomain`], so a
//! world digest can never collide with a dedup key or a report digest that
//! happens to hash the same bytes.

/// Declares `HashDomain` enum, `as_bytes()`, `ALL`, and `Display` from one list.
macro_rules! define_hash_domains {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $bytes:expr
        ),+ $(,)?
    ) => {
        /// Typed domain separator for [`super::hash::canonical_hash`].
        ///
        /// Every variant maps to a unique, null-terminated byte string used as
        /// a SHA-256 prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl HashDomain {
            /// The raw domain-separator bytes (null-terminated).
            #[must_use]
            pub const fn as_bytes(&self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $bytes, )+
                }
            }

            /// All domain variants in declaration order.
            pub const ALL: &[HashDomain] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for HashDomain {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $( Self::$variant => write!(f, stringify!($variant)), )+
                }
            }
        }
    };
}

define_hash_domains! {
    // -----------------------------------------------------------------------
    // Kernel (carrier layer)
    // -----------------------------------------------------------------------

    /// Quantized `WorldState` document digest.
    WorldState => b"LEVELCERT::WORLD_STATE::V1\0",

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Dedup key fingerprints (hex form used in reports).
    DedupKey => b"LEVELCERT::DEDUP_KEY::V1\0",

    /// Search report digest.
    SearchReport => b"LEVELCERT::SEARCH_REPORT::V1\0",

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    /// World template digest.
    Template => b"LEVELCERT::TEMPLATE::V1\0",

    /// Retry/verification policy snapshot digest.
    PolicySnapshot => b"LEVELCERT::POLICY_SNAPSHOT::V1\0",

    /// Reward schedule digest.
    RewardSchedule => b"LEVELCERT::REWARD_SCHEDULE::V1\0",

    /// Persisted level artifact digest.
    LevelArtifact => b"LEVELCERT::LEVEL_ARTIFACT::V1\0",
}
