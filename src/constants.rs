//! System-wide constants for block sizes, ID partitions and wire framing.

/// Number of object slots held by one RAM-repository cache block.
pub const CACHE_BLOCK_SIZE: usize = 64;

/// Number of bits membership covered by one Id-Set segment.
pub const SEGMENT_BITS: usize = 256;

/// Bytes of payload in one Id-Set segment (256 bits).
pub const SEGMENT_BYTES: usize = SEGMENT_BITS / 8;

/// Number of segments held per arena allocation block.
pub const ARENA_BLOCK_SEGMENTS: usize = 1024;

/// Buffered read/write chunk size used by the blob repository, matching
/// the source's `HZ_BLOCKSIZE` buffering granularity.
pub const HZ_BLOCKSIZE: usize = 4096;

/// Maximum key or value length for the ISAM file.
pub const ISAM_MAX_KV_LEN: usize = 256;

/// Logical block size of the ISAM data file.
pub const ISAM_BLOCK_SIZE: usize = 4096;

/// Reserved system class ID range (inclusive).
pub const CLASS_ID_SYSTEM: std::ops::RangeInclusive<u16> = 1..=20;
/// Reserved user class ID range (inclusive).
pub const CLASS_ID_USER: std::ops::RangeInclusive<u16> = 21..=50;
/// Reserved configuration class ID range (inclusive).
pub const CLASS_ID_CONFIG: std::ops::RangeInclusive<u16> = 51..=1000;
/// Composite (sub-class-in-context) class ID range, open-ended from 1001.
pub const CLASS_ID_COMPOSITE_START: u16 = 1001;

/// Reserved system member ID range (inclusive).
pub const MEMBER_ID_SYSTEM: std::ops::RangeInclusive<u16> = 1..=500;
/// Reserved user member ID range (inclusive).
pub const MEMBER_ID_USER: std::ops::RangeInclusive<u16> = 501..=1000;
/// Reserved configuration member ID range, open-ended from 1001.
pub const MEMBER_ID_CONFIG_START: u16 = 1001;

/// Default directory the ADP registry persists application profiles to.
pub const ADP_PROFILE_DIR: &str = "/etc/hzDelta.d";

/// Default path of the cluster-wide mirror daemon address/port file.
pub const CLUSTER_CONFIG_PATH: &str = "/etc/hzDelta.d/cluster.xml";

/// Default send/receive timeout for the Delta Client, in seconds.
pub const DELTA_CLIENT_TIMEOUT_SECS: u64 = 30;

/// Escape byte used in the delta-log wire encoding.
pub const DELTA_ESCAPE_BYTE: u8 = 0x01;
