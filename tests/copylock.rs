use amiflux::{
    decode_track, encode_track, BitStream, Disk, TrackError, TrackFormat, TrackInfo,
    DEFAULT_TOTAL_BITS, SPEED_AVG,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Cell geometry of one CopyLock sector including its trailing gap.
const SECTOR_CELLS: usize = (514 + 48) * 8 * 2;
// Header mark, two zero bytes, sync and index byte precede the data.
const DATA_LEAD_CELLS: usize = 5 * 8 * 2;
const DATA_CELLS: usize = 512 * 8 * 2;

fn seed_track(format: TrackFormat, seed: u32) -> TrackInfo {
    let mut ti = TrackInfo::new(format);
    ti.data = seed.to_be_bytes().to_vec();
    ti
}

#[test]
fn test_clean_capture_roundtrip() {
    init();
    let ti = seed_track(TrackFormat::Copylock, 0x0012_3456);
    let tbuf = encode_track(0, &ti).unwrap();
    assert_eq!(tbuf.len(), DEFAULT_TOTAL_BITS as usize);
    assert!(!tbuf.auto_sector_split());

    let mut disk = Disk::new();
    let mut stream = BitStream::from(tbuf);
    let out = decode_track(&mut disk, 0, TrackFormat::Copylock, &mut stream).unwrap();

    assert_eq!(out.data, vec![0x00, 0x12, 0x34, 0x56]);
    assert!(out.is_valid());
    assert_eq!(out.total_bits, DEFAULT_TOTAL_BITS);
    assert_eq!(out.data_bitoff, 0);
    assert!(disk.warnings().is_empty(), "{:?}", disk.warnings());
}

#[test]
fn test_old_variant_roundtrip() {
    init();
    let ti = seed_track(TrackFormat::CopylockOld, 0x002A_5E71);
    let tbuf = encode_track(2, &ti).unwrap();
    assert_eq!(tbuf.len(), DEFAULT_TOTAL_BITS as usize);

    let mut disk = Disk::new();
    let mut stream = BitStream::from(tbuf);
    let out = decode_track(&mut disk, 2, TrackFormat::CopylockOld, &mut stream).unwrap();

    assert_eq!(out.data, vec![0x00, 0x2A, 0x5E, 0x71]);
    assert!(out.is_valid());
    assert_eq!(out.data_bitoff, 0);
    assert!(disk.warnings().is_empty(), "{:?}", disk.warnings());
}

#[test]
fn test_reconstructs_missing_sector() {
    init();
    let ti = seed_track(TrackFormat::Copylock, 0x0012_3456);
    let tbuf = encode_track(0, &ti).unwrap();

    // Wipe sector 3 entirely; the seed recovered from the other sectors
    // regenerates it.
    let mut cells = tbuf.cells().clone();
    let speeds = tbuf.speeds().to_vec();
    for i in 3 * SECTOR_CELLS..4 * SECTOR_CELLS {
        cells.set(i, false);
    }

    let mut disk = Disk::new();
    let mut stream = BitStream::with_speeds(cells, speeds);
    let out = decode_track(&mut disk, 0, TrackFormat::Copylock, &mut stream).unwrap();

    assert_eq!(out.data, vec![0x00, 0x12, 0x34, 0x56]);
    assert!(out.is_valid());
    assert_eq!(out.data_bitoff, 0);
    assert_eq!(disk.warnings().len(), 1);
    assert!(disk.warnings()[0]
        .msg
        .starts_with("Reconstructed damaged track"));
}

#[test]
fn test_zero_seed_is_rejected() {
    init();
    // An all-zero data stream satisfies the byte check but yields a seed
    // that cannot regenerate a track.
    let ti = seed_track(TrackFormat::Copylock, 0);
    let tbuf = encode_track(0, &ti).unwrap();

    let mut disk = Disk::new();
    let mut stream = BitStream::from(tbuf);
    let result = decode_track(&mut disk, 0, TrackFormat::Copylock, &mut stream);
    assert_eq!(result.err(), Some(TrackError::NoMatch));
}

fn decode_with_sector4_data_speed(speed: u32) -> (Disk, TrackInfo) {
    let ti = seed_track(TrackFormat::Copylock, 0x0012_3456);
    let tbuf = encode_track(0, &ti).unwrap();

    let cells = tbuf.cells().clone();
    let mut speeds = tbuf.speeds().to_vec();
    let start = 4 * SECTOR_CELLS + DATA_LEAD_CELLS;
    for s in speeds[start..start + DATA_CELLS].iter_mut() {
        *s = speed;
    }

    let mut disk = Disk::new();
    let mut stream = BitStream::with_speeds(cells, speeds);
    let out = decode_track(&mut disk, 0, TrackFormat::Copylock, &mut stream).unwrap();
    (disk, out)
}

#[test]
fn test_clearly_short_sector_is_silent() {
    init();
    // 8% short of nominal is comfortably past the -4% threshold.
    let (disk, out) = decode_with_sector4_data_speed(SPEED_AVG * 92 / 100);
    assert!(out.is_valid());
    assert!(disk.warnings().is_empty(), "{:?}", disk.warnings());
}

#[test]
fn test_barely_short_sector_warns() {
    init();
    let (disk, out) = decode_with_sector4_data_speed(SPEED_AVG * 98 / 100);
    assert!(out.is_valid());
    assert_eq!(disk.warnings().len(), 1);
    assert_eq!(
        disk.warnings()[0].msg,
        "Short sector is only -2.00% different"
    );
}
