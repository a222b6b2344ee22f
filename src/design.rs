//! Per-axis design matrices and their tensor product.
use crate::error::Result;
use crate::knots::KnotVector;
use crate::sparse::CooMatrix;

/// Design matrix of one axis: row `i` holds every basis function evaluated
/// at `centers[i]`. Each row has at most `degree + 1` nonzeros.
///
/// Centers outside the knot domain produce an empty row.
pub fn design_matrix(centers: &[f64], knots: &KnotVector<f64>) -> CooMatrix {
    let mut b = CooMatrix::zeros(centers.len(), knots.n_basis());
    for (i, &x) in centers.iter().enumerate() {
        if let Some(local) = knots.local_basis(x) {
            for (j, v) in local.iter() {
                b.push(i, j, v);
            }
        }
    }
    b
}

/// Tensor-product design matrix `B_0 ⊗ B_1 ⊗ ... ⊗ B_{N-1}`, mapping
/// C-ordered coefficients to the C-ordered grid.
pub fn tensor_design(per_axis: &[CooMatrix]) -> Result<CooMatrix> {
    CooMatrix::kron_chain(per_axis)
}

/// `BᵀB` for the tensor design matrix, formed as `⊗ (B_dᵀ B_d)`
/// without materializing the product of the full tensor matrix.
pub fn tensor_gram(per_axis: &[CooMatrix]) -> Result<CooMatrix> {
    let grams: Vec<CooMatrix> = per_axis.iter().map(CooMatrix::gram).collect();
    CooMatrix::kron_chain(&grams)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::bin_centers;

    #[test]
    fn test_design_rows_sum_to_one() {
        let x = bin_centers(0.0, 10.0, 20);
        let kv = KnotVector::for_centers(&x, 5, 3).unwrap();
        let b = design_matrix(&x, &kv);
        assert_eq!((b.nrows(), b.ncols()), (20, 9));

        let mut row_sums = vec![0.0; 20];
        b.matvec(&vec![1.0; 9], &mut row_sums).unwrap();
        assert!(row_sums.iter().all(|s| (s - 1.0).abs() < 1e-12));
        assert!(b.nnz() <= 20 * 4);
    }

    #[test]
    fn test_tensor_gram_matches_explicit() {
        let x = bin_centers(0.0, 1.0, 7);
        let y = bin_centers(-1.0, 1.0, 5);
        let bx = design_matrix(&x, &KnotVector::for_centers(&x, 3, 2).unwrap());
        let by = design_matrix(&y, &KnotVector::for_centers(&y, 3, 1).unwrap());
        let per_axis = [bx, by];

        let explicit = tensor_design(&per_axis).unwrap().gram().to_dense();
        let factored = tensor_gram(&per_axis).unwrap().to_dense();
        assert_eq!(explicit.len(), factored.len());
        for (a, b) in explicit.iter().zip(factored.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
