use amiflux::{
    decode_track, encode_track, BitStream, Disk, TrackError, TrackFormat, TrackInfo,
    DEFAULT_TOTAL_BITS,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// One AmigaDOS sector is 544 decoded byte-times.
const SECTOR_CELLS: usize = 544 * 8 * 2;

fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

#[test]
fn test_roundtrip() {
    init();
    let payload = random_payload(11 * 512, 0xADF);
    let mut ti = TrackInfo::new(TrackFormat::AmigaDos);
    ti.data = payload.clone();

    let tbuf = encode_track(3, &ti).unwrap();
    assert_eq!(tbuf.len(), DEFAULT_TOTAL_BITS as usize);

    let mut disk = Disk::new();
    let mut stream = BitStream::from(tbuf);
    let out = decode_track(&mut disk, 3, TrackFormat::AmigaDos, &mut stream).unwrap();

    assert_eq!(out.data, payload);
    assert!(out.is_valid());
    assert_eq!(out.data_bitoff, 0);
}

#[test]
fn test_wrong_track_number_rejected() {
    init();
    let payload = random_payload(11 * 512, 0xADF);
    let mut ti = TrackInfo::new(TrackFormat::AmigaDos);
    ti.data = payload;

    let tbuf = encode_track(3, &ti).unwrap();
    let mut disk = Disk::new();
    let mut stream = BitStream::from(tbuf);
    let result = decode_track(&mut disk, 4, TrackFormat::AmigaDos, &mut stream);
    assert_eq!(result.err(), Some(TrackError::NoMatch));
}

#[test]
fn test_partial_track_keeps_recovered_sectors() {
    init();
    let payload = random_payload(11 * 512, 0x5EC);
    let mut ti = TrackInfo::new(TrackFormat::AmigaDos);
    ti.data = payload.clone();

    let tbuf = encode_track(0, &ti).unwrap();
    let mut cells = tbuf.cells().clone();
    for i in 5 * SECTOR_CELLS..6 * SECTOR_CELLS {
        cells.set(i, false);
    }

    let mut disk = Disk::new();
    let mut stream = BitStream::new(cells);
    let out = decode_track(&mut disk, 0, TrackFormat::AmigaDos, &mut stream).unwrap();

    assert!(!out.is_valid());
    assert_eq!(out.valid_sectors.count(), 10);
    assert!(!out.valid_sectors.is_set(5));
    // Undamaged sectors decode intact; the wiped one reads back as zeros.
    assert_eq!(out.data[..5 * 512], payload[..5 * 512]);
    assert_eq!(out.data[6 * 512..], payload[6 * 512..]);
    assert_eq!(out.data[5 * 512..6 * 512], vec![0u8; 512][..]);
    assert_eq!(out.data_bitoff, 0);
}
