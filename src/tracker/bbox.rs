/// 軸平行バウンディングボックス（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// other が self に完全に含まれるか（境界の一致も含む）
    pub fn contains(&self, other: &BBox) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.x + self.width >= other.x + other.width
            && self.y + self.height >= other.y + other.height
    }

    /// クロップローカル座標 → フレーム座標への平行移動
    pub fn offset_x(&self, dx: i32) -> BBox {
        BBox {
            x: self.x + dx,
            ..*self
        }
    }

    /// 消費側（特徴抽出・描画）向けに縮小したコピーを返す
    ///
    /// 生の検出枠は実際の被写体より一回り大きく出るため、
    /// 横10%・上7%だけ詰めて縦横とも80%に縮める。保持中の追跡枠は変更しない。
    pub fn shrunk(&self) -> BBox {
        let w = self.width as f64;
        let h = self.height as f64;
        BBox {
            x: self.x + (w * 0.1).round() as i32,
            y: self.y + (h * 0.07).round() as i32,
            width: (w * 0.8).round() as i32,
            height: (h * 0.8).round() as i32,
        }
    }
}
