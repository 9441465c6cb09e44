use april_matrix::backend::PARALLEL_MIN_LEN;
use april_matrix::{Dispatch, MajorOrder, Matrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random(dims: &[usize], order: MajorOrder, seed: u64) -> Matrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n: usize = dims.iter().product();
    let data = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
    Matrix::from_vec(dims, order, data).unwrap()
}

#[test]
fn test_parallel_sum_matches_sequential_bitwise() {
    let m = random(&[300, 200], MajorOrder::RowMajor, 7);
    assert!(m.size() >= PARALLEL_MIN_LEN);
    let seq = m.sum_with(Dispatch::Sequential);
    let par = m.sum_with(Dispatch::Parallel);
    assert_eq!(seq.to_bits(), par.to_bits());

    let window = m.sub_matrix(&[10, 5], &[250, 180]).unwrap();
    assert_eq!(
        window.sum_with(Dispatch::Sequential).to_bits(),
        window.sum_with(Dispatch::Parallel).to_bits()
    );
}

#[test]
fn test_large_window_scal_matches_reference() {
    let m = random(&[256, 256], MajorOrder::ColMajor, 11);
    let before = m.to_vec();
    let mut window = m.sub_matrix(&[0, 0], &[256, 200]).unwrap();
    window.scal(2.0);
    let after = m.to_vec();
    // column-major: the first 200 columns are the first 200 * 256 elements
    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        let expected = if i < 200 * 256 { b * 2.0 } else { *b };
        assert_eq!(*a, expected);
    }
}

#[test]
fn test_transposed_large_binary_op() {
    let a = random(&[200, 200], MajorOrder::RowMajor, 3);
    let t = a.transpose();
    let mut out = Matrix::<f64>::new(&[200, 200]).unwrap();
    out.fill(1.0);
    out.cmul(&t).unwrap();
    for (r, c) in [(0, 0), (3, 199), (150, 7), (199, 198)] {
        assert_eq!(out.get(&[r, c]).unwrap(), a.get(&[c, r]).unwrap());
    }
    assert!(out.equals(&t, 0.0).unwrap());
}

#[test]
fn test_parallel_fill_on_aliasing_views() {
    let mut m = Matrix::<f32>::new(&[512, 128]).unwrap();
    m.fill(1.0);
    let mut rows = m.sub_matrix(&[256, 0], &[256, 128]).unwrap();
    rows.scalar_add(2.0);
    assert_eq!(m.sum(), (256 * 128) as f32 * 4.0);
    assert_eq!(m.sum_with(Dispatch::Parallel), m.sum());
}
