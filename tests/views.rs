use std::sync::Arc;

use strided_ndarray::{
    broadcast, contiguous_strides, gather_elements, get_offsets, is_dense, strided_dims,
    AxisIndex, NDArray, NdError,
};

#[test]
fn test_views_share_buffer() {
    let a = NDArray::range(24).reshaped(&[2, 3, 4]).unwrap();
    let views = [
        a.transposed(),
        a.permuted(&[1, 0, 2]).unwrap(),
        a.select(1, 2).unwrap(),
        a.subscript(&[AxisIndex::reversed(), (1..).into()]).unwrap(),
        a.reshaped(&[4, -1]).unwrap(),
        a.expand_dims(1).unwrap(),
    ];
    for v in &views {
        assert!(v.shares_buffer(&a), "{v:?} copied its buffer");
    }
}

#[test]
fn test_element_matches_offset_formula() {
    let a = NDArray::range(60).reshaped(&[3, 4, 5]).unwrap();
    let v = a
        .subscript(&[
            AxisIndex::slice(None, None, -1),
            AxisIndex::slice(Some(1), None, 2),
            AxisIndex::All,
        ])
        .unwrap()
        .transposed();
    assert_eq!(v.shape(), &[5, 2, 3]);
    for i in 0..5 {
        for j in 0..2 {
            for k in 0..3 {
                let offset = v.base_offset() as isize
                    + i as isize * v.strides()[0]
                    + j as isize * v.strides()[1]
                    + k as isize * v.strides()[2];
                let got = v.element(&[i, j, k]).unwrap();
                assert_eq!(got, v.data()[offset as usize]);
                // a[2 - k, 1 + 2 * j, i]
                let want = a
                    .element(&[2 - k, 1 + 2 * j, i])
                    .unwrap();
                assert_eq!(got, want);
            }
        }
    }
}

#[test]
fn test_gather_reversed_view() {
    let a = NDArray::range(6).reshaped(&[2, 3]).unwrap();
    let r = a
        .subscript(&[AxisIndex::reversed(), AxisIndex::reversed()])
        .unwrap();
    assert_eq!(gather_elements(&r), vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
    assert_eq!(r.elements().len(), r.volume());
}

#[test]
fn test_dense_classification() {
    let a = NDArray::range(24).reshaped(&[2, 3, 4]).unwrap();
    assert!(is_dense(a.shape(), a.strides()));
    assert!(!a.transposed().is_dense());
    assert!(a.select(0, 1).unwrap().is_dense());
    assert!(!a.select(2, 1).unwrap().is_dense());
    assert_eq!(strided_dims(a.shape(), a.strides()), 3);
    let col = a.subscript(&[AxisIndex::All, 1.into()]).unwrap();
    assert_eq!(strided_dims(col.shape(), col.strides()), 1);
}

#[test]
fn test_layout_helpers() {
    assert_eq!(contiguous_strides(&[2, 3, 4]), vec![12, 4, 1]);
    assert_eq!(get_offsets(&[2, 2], &[1, 2]), vec![0, 2, 1, 3]);
    assert_eq!(get_offsets(&[], &[]), vec![0]);
    assert!(get_offsets(&[2, 0], &[0, 1]).is_empty());
}

#[test]
fn test_broadcast_pair() {
    let a = NDArray::range(8).reshaped(&[2, 2, 2]).unwrap();
    let b = NDArray::range(2).reshaped(&[2, 1]).unwrap();
    let (a2, b2) = broadcast(&a, &b).unwrap();
    assert_eq!(a2.shape(), b2.shape());
    assert_eq!(b2.strides(), &[0, 1, 0]);
    assert_eq!(b2.elements(), vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn test_reshape_errors() {
    let a = NDArray::range(6);
    assert_eq!(
        a.reshaped(&[4, 2]).unwrap_err(),
        NdError::ElementCountMismatch {
            expected: 8,
            actual: 6
        }
    );
    assert!(matches!(
        a.reshaped(&[-1, -1]),
        Err(NdError::InvalidShape(_))
    ));
}

#[test]
fn test_from_parts_bounds() {
    let data: Arc<[f32]> = Arc::from(vec![0.0f32; 6]);
    assert!(NDArray::from_parts(data.clone(), &[3], &[-2], 4).is_ok());
    assert_eq!(
        NDArray::from_parts(data.clone(), &[3], &[-2], 3).unwrap_err(),
        NdError::OffsetOutOfBounds
    );
    assert_eq!(
        NDArray::from_parts(data, &[2, 2], &[2], 0).unwrap_err(),
        NdError::StrideLengthMismatch
    );
}

#[test]
fn test_equality() {
    let a = NDArray::range(4);
    let b = NDArray::range(4).reshaped(&[2, 2]).unwrap();
    assert_ne!(a, b);
    assert_eq!(a, b.reshaped(&[4]).unwrap());
    assert_eq!(b.transposed().transposed(), b);
    assert_ne!(
        NDArray::from_vec(vec![0.0]),
        NDArray::from_vec(vec![-0.0])
    );
}

#[test]
fn test_stack_views() {
    let a = NDArray::range(4).reshaped(&[2, 2]).unwrap();
    let s = NDArray::stack(&[a.clone(), a.transposed()]).unwrap();
    assert_eq!(s.shape(), &[2, 2, 2]);
    assert_eq!(
        s.elements(),
        vec![0.0, 1.0, 2.0, 3.0, 0.0, 2.0, 1.0, 3.0]
    );
}
