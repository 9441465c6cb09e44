use april_matrix::codec::{self, Format};
use april_matrix::{DecodeError, Error, ErrorKind, MajorOrder, Matrix, Scalar};
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_round_trips<T: Scalar>(m: &Matrix<T>) {
    for format in [Format::Ascii, Format::Binary] {
        let bytes = codec::write_to_bytes(m, format);
        let back: Matrix<T> = codec::read_matrix(&bytes).unwrap();
        assert_eq!(back.dims(), m.dims(), "{format:?}");
        assert_eq!(back.major_order(), m.major_order(), "{format:?}");
        assert_eq!(back.to_vec(), m.to_vec(), "{format:?}");
    }
}

#[test]
fn test_round_trip_every_scalar_type() {
    let mut rng = StdRng::seed_from_u64(42);
    let floats: Vec<f32> = (0..24).map(|_| rng.random::<f32>() * 1e3 - 5e2).collect();
    let doubles: Vec<f64> = (0..24).map(|_| rng.random::<f64>() * 1e-3).collect();
    let complex: Vec<Complex32> = (0..24).map(|_| Complex32::new(rng.random(), -rng.random::<f32>())).collect();
    let ints: Vec<i32> = (0..24).map(|_| rng.random()).collect();
    let uints: Vec<u32> = (0..24).map(|_| rng.random()).collect();
    let chars: Vec<u8> = (0..24).map(|_| rng.random()).collect();
    let bools: Vec<bool> = (0..24).map(|_| rng.random()).collect();

    assert_round_trips(&Matrix::from_vec(&[4, 6], MajorOrder::RowMajor, floats).unwrap());
    assert_round_trips(&Matrix::from_vec(&[2, 3, 4], MajorOrder::ColMajor, doubles).unwrap());
    assert_round_trips(&Matrix::from_vec(&[24], MajorOrder::RowMajor, complex).unwrap());
    assert_round_trips(&Matrix::from_vec(&[6, 4], MajorOrder::ColMajor, ints).unwrap());
    assert_round_trips(&Matrix::from_vec(&[3, 8], MajorOrder::RowMajor, uints).unwrap());
    assert_round_trips(&Matrix::from_vec(&[12, 2], MajorOrder::RowMajor, chars).unwrap());
    assert_round_trips(&Matrix::from_vec(&[2, 2, 6], MajorOrder::ColMajor, bools).unwrap());
}

#[test]
fn test_round_trip_of_sub_matrix_is_compact() {
    let m = Matrix::from_vec(&[4, 4], MajorOrder::RowMajor, (0..16).map(|i| i as f32).collect()).unwrap();
    let window = m.sub_matrix(&[1, 1], &[2, 3]).unwrap();
    let bytes = codec::write_to_bytes(&window, Format::Binary);
    let back: Matrix<f32> = codec::read_matrix(&bytes).unwrap();
    assert!(back.is_contiguous());
    assert_eq!(back.to_vec(), vec![5.0, 6.0, 7.0, 9.0, 10.0, 11.0]);
}

#[test]
fn test_two_by_two_double_layout() {
    let m = Matrix::from_vec(&[2, 2], MajorOrder::RowMajor, vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
    let bytes = codec::write_to_bytes(&m, Format::Binary);
    let header = b"2\n2 2\nbinary row_major\n";
    assert_eq!(&bytes[..header.len()], header);
    assert_eq!(bytes.len(), header.len() + 4 * 8);
    assert_eq!(&bytes[header.len()..header.len() + 8], &1.0f64.to_le_bytes());

    let ascii = codec::write_to_bytes(&m, Format::Ascii);
    assert_eq!(ascii, b"2\n2 2\nascii row_major\n1 2 3 4\n");
}

#[test]
fn test_truncated_binary_body() {
    let m = Matrix::<f32>::new(&[3]).unwrap();
    let mut bytes = codec::write_to_bytes(&m, Format::Binary);
    bytes.truncate(bytes.len() - 2);
    let err = codec::read_matrix::<f32>(&bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::Truncated { expected: 3, found: 2 })
    ));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_missing_ascii_elements() {
    let err = codec::read_matrix::<i32>(b"1\n4\nascii row_major\n1 2 3\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::Truncated { expected: 4, found: 3 })
    ));
}

#[test]
fn test_malformed_ascii_token() {
    let err = codec::read_matrix::<u32>(b"1\n3\nascii row_major\n1 -2 3\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::MalformedToken { index: 1, .. })
    ));
}

#[test]
fn test_trailing_bytes() {
    let ok = codec::read_matrix::<i32>(b"1\n2\nascii col_major\n5 6\n\n  \n").unwrap();
    assert_eq!(ok.to_vec(), vec![5, 6]);
    assert_eq!(ok.major_order(), MajorOrder::ColMajor);

    let err = codec::read_matrix::<i32>(b"1\n2\nascii row_major\n5 6 7\n").unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::TrailingData(_))));
}

#[test]
fn test_bad_headers() {
    for input in [
        &b""[..],
        b"x\n",
        b"2\n3\nascii row_major\n",
        b"1\n0\nascii row_major\n",
        b"1\n3 \n",
    ] {
        let err = codec::read_matrix::<f32>(input).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::BadHeader(_))), "{input:?}");
    }
    let err = codec::read_matrix::<f32>(b"1\n1\nascii zigzag\n0\n").unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::UnknownOrder(_))));
}

#[test]
fn test_writer_reader_and_file() {
    let m = Matrix::from_vec(&[3, 1], MajorOrder::ColMajor, vec![0.1f64, -7.5, 1e-300]).unwrap();

    let mut sink = Vec::new();
    let written = codec::write_matrix(&m, Format::Ascii, &mut sink).unwrap();
    assert_eq!(written, sink.len());
    let back: Matrix<f64> = codec::read_matrix_from(&mut std::io::Cursor::new(sink)).unwrap();
    assert_eq!(back.to_vec(), m.to_vec());

    let path = std::env::temp_dir().join(format!("april_matrix_codec_{}.mat", std::process::id()));
    codec::write_to_file(&m, Format::Binary, &path).unwrap();
    let loaded: Matrix<f64> = codec::read_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(loaded.equals(&m, 0.0).unwrap());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = codec::read_from_file::<f32, _>("/nonexistent/april_matrix/none.mat").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_huge_announced_extent_with_tiny_body() {
    let cases: [&[u8]; 4] = [
        b"1\n2305843009213693951\nbinary row_major\n\x00",
        b"1\n1000000000000\nbinary col_major\n\x00\x00\x00\x00\x00\x00\x00\x00",
        b"2\n4611686018427387903 2\nascii row_major\n1\n",
        b"1\n1000000000000\nascii col_major\n1 2 3\n",
    ];
    for input in cases {
        let err = codec::read_matrix::<f64>(input).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Truncated { .. })), "{input:?}");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}

#[test]
fn test_element_count_overflowing_usize() {
    for format in ["ascii", "binary"] {
        let input = format!("2\n{} 2\n{format} row_major\n0\n", usize::MAX);
        let err = codec::read_matrix::<i32>(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::BadHeader(_))), "{format}");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
