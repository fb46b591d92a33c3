/// 10の倍数へ四捨五入する（143→140, 79→80, 145→150）
///
/// ヒストグラム長を10の倍数に揃えることで、後段のビン削減が端数なしで
/// 割り切れるようにする。
pub fn round_to_ten(n: u32) -> u32 {
    let r = n % 10;
    if r < 5 {
        n - r
    } else {
        n + (10 - r)
    }
}

/// 合計が1になるよう正規化する。合計が0なら全ゼロのまま返す（ゼロ除算ガード）
pub fn sum_to_one(hist: &mut [f64]) {
    let total: f64 = hist.iter().sum();
    if total != 0.0 {
        for value in hist.iter_mut() {
            *value /= total;
        }
    }
}

/// ヒストグラムを new_dim ビンへ量子化する
///
/// 連続する floor(len / new_dim) 個のソースビンを1つの出力ビンへ足し込む
/// （補間ではなく合併）。割り切れるときは総和が保存される。
pub fn quantize(hist: &[f64], new_dim: usize) -> Vec<f64> {
    if new_dim == 0 {
        return Vec::new();
    }
    let scale = hist.len() / new_dim;
    if scale == 0 {
        return vec![0.0; new_dim];
    }
    (0..new_dim)
        .map(|i| hist[i * scale..(i + 1) * scale].iter().sum())
        .collect()
}
