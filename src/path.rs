// Path-data interpreter for the illustration subset.
//
// Supported commands: M/m, L/l, H/h, V/v, C/c, S/s, Q/q, Z/z.
// Anything else (arcs, smooth quadratics) rejects the whole path.

/// Cubic Bezier handle length for a quarter ellipse.
const KAPPA: f32 = 0.552_284_75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub fn mul(self, other: Self) -> Self {
        // [self] * [other]
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    CubicTo(f32, f32, f32, f32, f32, f32),
    QuadTo(f32, f32, f32, f32),
    Close,
}

/// Geometric path in local (artwork) coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    segs: Vec<PathSeg>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segs: Vec<PathSeg>) -> Self {
        Self { segs }
    }

    pub fn segments(&self) -> &[PathSeg] {
        &self.segs
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    pub fn push(&mut self, seg: PathSeg) {
        self.segs.push(seg);
    }

    pub fn subpath_count(&self) -> usize {
        self.segs
            .iter()
            .filter(|seg| matches!(seg, PathSeg::MoveTo(..)))
            .count()
    }

    pub fn transform(&self, m: Matrix) -> PathData {
        let mut out = Vec::with_capacity(self.segs.len());
        for seg in &self.segs {
            match *seg {
                PathSeg::MoveTo(x, y) => {
                    let (x, y) = m.apply(x, y);
                    out.push(PathSeg::MoveTo(x, y));
                }
                PathSeg::LineTo(x, y) => {
                    let (x, y) = m.apply(x, y);
                    out.push(PathSeg::LineTo(x, y));
                }
                PathSeg::CubicTo(x1, y1, x2, y2, x, y) => {
                    let (x1, y1) = m.apply(x1, y1);
                    let (x2, y2) = m.apply(x2, y2);
                    let (x, y) = m.apply(x, y);
                    out.push(PathSeg::CubicTo(x1, y1, x2, y2, x, y));
                }
                PathSeg::QuadTo(x1, y1, x, y) => {
                    let (x1, y1) = m.apply(x1, y1);
                    let (x, y) = m.apply(x, y);
                    out.push(PathSeg::QuadTo(x1, y1, x, y));
                }
                PathSeg::Close => out.push(PathSeg::Close),
            }
        }
        PathData { segs: out }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("unsupported path command '{command}' at offset {offset}")]
    UnsupportedCommand { command: char, offset: usize },

    #[error("path data must begin with a command, found '{found}' at offset {offset}")]
    MissingCommand { found: char, offset: usize },

    #[error("command '{command}' takes groups of {expected} numbers, got {found}")]
    IncompleteGroup {
        command: char,
        expected: usize,
        found: usize,
    },
}

/// Numbers consumed per group, or `None` for commands outside the subset.
fn command_arity(command: char) -> Option<usize> {
    match command.to_ascii_uppercase() {
        'M' | 'L' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'S' | 'Q' => Some(4),
        'Z' => Some(0),
        _ => None,
    }
}

pub fn interpret_path_data(d: &str) -> Result<PathData, PathError> {
    let mut path = PathData::new();
    let mut p = PathParser::new(d);

    let mut cur_x = 0.0f32;
    let mut cur_y = 0.0f32;
    let mut start_x = 0.0f32;
    let mut start_y = 0.0f32;
    let mut ctrl_x = 0.0f32;
    let mut ctrl_y = 0.0f32;
    let mut prev_cubic = false;

    while let Some((command, offset)) = p.next_command()? {
        let Some(arity) = command_arity(command) else {
            return Err(PathError::UnsupportedCommand { command, offset });
        };
        let args = p.numbers();
        if arity > 0 && (args.is_empty() || args.len() % arity != 0) {
            return Err(PathError::IncompleteGroup {
                command,
                expected: arity,
                found: args.len(),
            });
        }
        let rel = command.is_ascii_lowercase();
        let upper = command.to_ascii_uppercase();

        if upper == 'Z' {
            path.push(PathSeg::Close);
            cur_x = start_x;
            cur_y = start_y;
            ctrl_x = cur_x;
            ctrl_y = cur_y;
            prev_cubic = false;
            continue;
        }

        for (i, group) in args.chunks_exact(arity).enumerate() {
            // Offsets for relative coordinates come from the point before this group.
            let (ox, oy) = if rel { (cur_x, cur_y) } else { (0.0, 0.0) };
            match upper {
                'M' => {
                    cur_x = ox + group[0];
                    cur_y = oy + group[1];
                    if i == 0 {
                        path.push(PathSeg::MoveTo(cur_x, cur_y));
                        start_x = cur_x;
                        start_y = cur_y;
                    } else {
                        path.push(PathSeg::LineTo(cur_x, cur_y));
                    }
                }
                'L' => {
                    cur_x = ox + group[0];
                    cur_y = oy + group[1];
                    path.push(PathSeg::LineTo(cur_x, cur_y));
                }
                'H' => {
                    cur_x = if rel { cur_x + group[0] } else { group[0] };
                    path.push(PathSeg::LineTo(cur_x, cur_y));
                }
                'V' => {
                    cur_y = if rel { cur_y + group[0] } else { group[0] };
                    path.push(PathSeg::LineTo(cur_x, cur_y));
                }
                'C' => {
                    let (x1, y1) = (ox + group[0], oy + group[1]);
                    let (x2, y2) = (ox + group[2], oy + group[3]);
                    let (x, y) = (ox + group[4], oy + group[5]);
                    path.push(PathSeg::CubicTo(x1, y1, x2, y2, x, y));
                    cur_x = x;
                    cur_y = y;
                    ctrl_x = x2;
                    ctrl_y = y2;
                    prev_cubic = true;
                    continue;
                }
                'S' => {
                    let (x1, y1) = if prev_cubic {
                        (2.0 * cur_x - ctrl_x, 2.0 * cur_y - ctrl_y)
                    } else {
                        (cur_x, cur_y)
                    };
                    let (x2, y2) = (ox + group[0], oy + group[1]);
                    let (x, y) = (ox + group[2], oy + group[3]);
                    path.push(PathSeg::CubicTo(x1, y1, x2, y2, x, y));
                    cur_x = x;
                    cur_y = y;
                    ctrl_x = x2;
                    ctrl_y = y2;
                    prev_cubic = true;
                    continue;
                }
                'Q' => {
                    let (x1, y1) = (ox + group[0], oy + group[1]);
                    let (x, y) = (ox + group[2], oy + group[3]);
                    path.push(PathSeg::QuadTo(x1, y1, x, y));
                    cur_x = x;
                    cur_y = y;
                }
                _ => unreachable!("arity table covers every accepted command"),
            }
            ctrl_x = cur_x;
            ctrl_y = cur_y;
            prev_cubic = false;
        }
    }

    Ok(path)
}

pub fn rect_path(x: f32, y: f32, w: f32, h: f32) -> PathData {
    PathData::from_segments(vec![
        PathSeg::MoveTo(x, y),
        PathSeg::LineTo(x + w, y),
        PathSeg::LineTo(x + w, y + h),
        PathSeg::LineTo(x, y + h),
        PathSeg::Close,
    ])
}

pub fn round_rect_path(x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) -> PathData {
    let rx = rx.clamp(0.0, w / 2.0);
    let ry = ry.clamp(0.0, h / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return rect_path(x, y, w, h);
    }
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let right = x + w;
    let bottom = y + h;
    PathData::from_segments(vec![
        PathSeg::MoveTo(x + rx, y),
        PathSeg::LineTo(right - rx, y),
        PathSeg::CubicTo(right - rx + kx, y, right, y + ry - ky, right, y + ry),
        PathSeg::LineTo(right, bottom - ry),
        PathSeg::CubicTo(
            right,
            bottom - ry + ky,
            right - rx + kx,
            bottom,
            right - rx,
            bottom,
        ),
        PathSeg::LineTo(x + rx, bottom),
        PathSeg::CubicTo(x + rx - kx, bottom, x, bottom - ry + ky, x, bottom - ry),
        PathSeg::LineTo(x, y + ry),
        PathSeg::CubicTo(x, y + ry - ky, x + rx - kx, y, x + rx, y),
        PathSeg::Close,
    ])
}

pub fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> PathData {
    let ox = rx * KAPPA;
    let oy = ry * KAPPA;
    PathData::from_segments(vec![
        PathSeg::MoveTo(cx + rx, cy),
        PathSeg::CubicTo(cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry),
        PathSeg::CubicTo(cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy),
        PathSeg::CubicTo(cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry),
        PathSeg::CubicTo(cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy),
        PathSeg::Close,
    ])
}

pub fn polyline_path(points: &[(f32, f32)], close: bool) -> PathData {
    let mut path = PathData::new();
    let mut it = points.iter();
    if let Some(&(x, y)) = it.next() {
        path.push(PathSeg::MoveTo(x, y));
        for &(x, y) in it {
            path.push(PathSeg::LineTo(x, y));
        }
        if close {
            path.push(PathSeg::Close);
        }
    }
    path
}

struct PathParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    i: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.i..)?.chars().next()
    }

    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            let b = self.bytes[self.i];
            if b == b' ' || b == b'\n' || b == b'\r' || b == b'\t' || b == b',' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    /// Any letter, ASCII or not, is a command; letters outside the subset are rejected by the
    /// caller.
    fn next_command(&mut self) -> Result<Option<(char, usize)>, PathError> {
        self.skip_ws();
        let offset = self.i;
        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };
        if ch.is_alphabetic() {
            self.i += ch.len_utf8();
            return Ok(Some((ch, offset)));
        }
        Err(PathError::MissingCommand { found: ch, offset })
    }

    /// Collects numbers up to the next command letter. Other characters that cannot start a
    /// number are skipped.
    fn numbers(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            let Some(ch) = self.peek_char() else {
                break;
            };
            if ch.is_alphabetic() {
                break;
            }
            match self.next_number() {
                Some(v) => out.push(v),
                None => self.i += ch.len_utf8(),
            }
        }
        out
    }

    fn next_number(&mut self) -> Option<f32> {
        let start = self.i;
        let mut has = false;

        if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'+' | b'-') {
            self.i += 1;
        }
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
            has = true;
        }
        if self.i < self.bytes.len() && self.bytes[self.i] == b'.' {
            let dot = self.i;
            self.i += 1;
            let mut frac = false;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
                frac = true;
            }
            if !frac && !has {
                self.i = dot;
            }
            has |= frac;
        }
        if !has {
            self.i = start;
            return None;
        }
        if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'e' | b'E') {
            // Only an exponent when digits follow; otherwise the letter is a command.
            let mut j = self.i + 1;
            if j < self.bytes.len() && matches!(self.bytes[j], b'+' | b'-') {
                j += 1;
            }
            if j < self.bytes.len() && self.bytes[j].is_ascii_digit() {
                self.i = j;
                while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                    self.i += 1;
                }
            }
        }

        let s = std::str::from_utf8(&self.bytes[start..self.i]).ok()?;
        s.parse::<f32>().ok()
    }
}
