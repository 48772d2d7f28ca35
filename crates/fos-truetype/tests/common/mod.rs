//! In-memory TrueType font builder for integration tests

#![allow(dead_code)]

/// Outline point: x, y, on-curve
pub type Pt = (i16, i16, bool);

/// Counter-clockwise in font space when `ccw`, clockwise otherwise
pub fn rect(x0: i16, y0: i16, x1: i16, y1: i16, ccw: bool) -> Vec<Pt> {
    let mut pts = vec![(x0, y0, true), (x0, y1, true), (x1, y1, true), (x1, y0, true)];
    if ccw {
        pts.reverse();
    }
    pts
}

/// Encode a simple glyph with word-sized deltas
pub fn simple_glyph(contours: &[Vec<Pt>]) -> Vec<u8> {
    let all: Vec<Pt> = contours.iter().flatten().copied().collect();
    let x_min = all.iter().map(|p| p.0).min().unwrap_or(0);
    let y_min = all.iter().map(|p| p.1).min().unwrap_or(0);
    let x_max = all.iter().map(|p| p.0).max().unwrap_or(0);
    let y_max = all.iter().map(|p| p.1).max().unwrap_or(0);

    let mut out = Vec::new();
    put_i16(&mut out, contours.len() as i16);
    for v in [x_min, y_min, x_max, y_max] {
        put_i16(&mut out, v);
    }
    let mut end = 0u16;
    for c in contours {
        end += c.len() as u16;
        put_u16(&mut out, end - 1);
    }
    put_u16(&mut out, 0); // instructionLength
    for p in &all {
        out.push(u8::from(p.2));
    }
    let (mut px, mut py) = (0i16, 0i16);
    for p in &all {
        put_i16(&mut out, p.0 - px);
        px = p.0;
    }
    for p in &all {
        put_i16(&mut out, p.1 - py);
        py = p.1;
    }
    out
}

/// Encode a compound glyph of offset components
pub fn compound_glyph(bounds: [i16; 4], components: &[(u16, i16, i16)]) -> Vec<u8> {
    let mut out = Vec::new();
    put_i16(&mut out, -1);
    for v in bounds {
        put_i16(&mut out, v);
    }
    for (i, &(glyph, dx, dy)) in components.iter().enumerate() {
        let more = if i + 1 < components.len() { 0x0020 } else { 0 };
        put_u16(&mut out, 0x0001 | 0x0002 | more);
        put_u16(&mut out, glyph);
        put_i16(&mut out, dx);
        put_i16(&mut out, dy);
    }
    out
}

pub struct FontBuilder {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    glyphs: Vec<Vec<u8>>,
    metrics: Vec<(u16, i16)>,
    number_of_h_metrics: Option<u16>,
    mappings: Vec<(u16, u16)>,
    arrays: Vec<(u16, Vec<u16>)>,
    kerning: Vec<(u16, u16, i16)>,
    raw_kern: Option<Vec<u8>>,
}

impl FontBuilder {
    /// Builder holding only `.notdef`
    pub fn new(units_per_em: u16) -> Self {
        Self {
            units_per_em,
            ascender: (units_per_em as i32 * 4 / 5) as i16,
            descender: -((units_per_em / 5) as i16),
            line_gap: 0,
            glyphs: vec![Vec::new()],
            metrics: vec![(units_per_em / 2, 0)],
            number_of_h_metrics: None,
            mappings: Vec::new(),
            arrays: Vec::new(),
            kerning: Vec::new(),
            raw_kern: None,
        }
    }

    pub fn metrics(mut self, ascender: i16, descender: i16, line_gap: i16) -> Self {
        self.ascender = ascender;
        self.descender = descender;
        self.line_gap = line_gap;
        self
    }

    /// Add a glyph record (empty for a blank glyph) and return its index
    pub fn glyph(&mut self, record: Vec<u8>, advance: u16, lsb: i16) -> u16 {
        self.glyphs.push(record);
        self.metrics.push((advance, lsb));
        (self.glyphs.len() - 1) as u16
    }

    /// Map one code point through an idDelta segment
    pub fn map(&mut self, code: u16, glyph: u16) {
        self.mappings.push((code, glyph));
    }

    /// Map `start..` through an idRangeOffset segment
    pub fn map_array(&mut self, start: u16, glyphs: Vec<u16>) {
        self.arrays.push((start, glyphs));
    }

    pub fn kern(&mut self, left: u16, right: u16, value: i16) {
        self.kerning.push((left, right, value));
    }

    /// Use `table` as the kern table verbatim
    pub fn raw_kern(&mut self, table: Vec<u8>) {
        self.raw_kern = Some(table);
    }

    /// Store fewer long metrics than glyphs
    pub fn h_metrics(&mut self, count: u16) {
        self.number_of_h_metrics = Some(count);
    }

    pub fn num_glyphs(&self) -> u16 {
        self.glyphs.len() as u16
    }

    pub fn build(&self) -> Vec<u8> {
        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        for g in &self.glyphs {
            put_u32(&mut loca, glyf.len() as u32);
            glyf.extend_from_slice(g);
            pad4(&mut glyf);
        }
        put_u32(&mut loca, glyf.len() as u32);

        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", self.cmap()),
            (*b"glyf", glyf),
            (*b"head", self.head()),
            (*b"hhea", self.hhea()),
            (*b"hmtx", self.hmtx()),
            (*b"loca", loca),
            (*b"maxp", self.maxp()),
        ];
        if let Some(raw) = &self.raw_kern {
            tables.push((*b"kern", raw.clone()));
        } else if !self.kerning.is_empty() {
            tables.push((*b"kern", self.kern_table()));
        }
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let header_len = 12 + 16 * tables.len();
        let mut font = Vec::new();
        put_u32(&mut font, 0x0001_0000);
        put_u16(&mut font, tables.len() as u16);
        font.extend_from_slice(&[0; 6]);

        let mut offset = header_len as u32;
        let mut head_offset = 0;
        for (tag, data) in &tables {
            font.extend_from_slice(tag);
            put_u32(&mut font, checksum(data));
            put_u32(&mut font, offset);
            put_u32(&mut font, data.len() as u32);
            if tag == b"head" {
                head_offset = offset as usize;
            }
            offset += (data.len() as u32).div_ceil(4) * 4;
        }
        for (_, data) in &tables {
            font.extend_from_slice(data);
            pad4(&mut font);
        }

        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&font));
        font[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
        font
    }

    fn head(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0); // checkSumAdjustment
        put_u32(&mut t, 0x5F0F_3CF5);
        put_u16(&mut t, 0x000B);
        put_u16(&mut t, self.units_per_em);
        t.extend_from_slice(&[0; 16]);
        for v in [0, self.descender, self.units_per_em as i16, self.ascender] {
            put_i16(&mut t, v);
        }
        put_u16(&mut t, 0); // macStyle
        put_u16(&mut t, 8); // lowestRecPPEM
        put_i16(&mut t, 2);
        put_i16(&mut t, 1); // long loca offsets
        put_i16(&mut t, 0);
        t
    }

    fn long_metrics(&self) -> u16 {
        self.number_of_h_metrics.unwrap_or(self.num_glyphs())
    }

    fn hhea(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_i16(&mut t, self.ascender);
        put_i16(&mut t, self.descender);
        put_i16(&mut t, self.line_gap);
        put_u16(&mut t, self.metrics.iter().map(|m| m.0).max().unwrap_or(0));
        t.extend_from_slice(&[0; 22]);
        put_u16(&mut t, self.long_metrics());
        t
    }

    fn maxp(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0000_5000);
        put_u16(&mut t, self.num_glyphs());
        t
    }

    fn hmtx(&self) -> Vec<u8> {
        let long = self.long_metrics() as usize;
        let mut t = Vec::new();
        for (i, &(advance, lsb)) in self.metrics.iter().enumerate() {
            if i < long {
                put_u16(&mut t, advance);
            }
            put_i16(&mut t, lsb);
        }
        t
    }

    fn cmap(&self) -> Vec<u8> {
        // (start, end, delta, glyph array)
        let mut segments: Vec<(u16, u16, i16, Option<&[u16]>)> = self
            .mappings
            .iter()
            .map(|&(code, glyph)| (code, code, glyph.wrapping_sub(code) as i16, None))
            .collect();
        for (start, glyphs) in &self.arrays {
            segments.push((*start, start + glyphs.len() as u16 - 1, 0, Some(glyphs.as_slice())));
        }
        segments.sort_by_key(|s| s.1);
        segments.push((0xFFFF, 0xFFFF, 1, None));

        let seg_count = segments.len() as u16;
        let mut range_offsets = Vec::new();
        let mut glyph_array = Vec::new();
        for (i, seg) in segments.iter().enumerate() {
            match seg.3 {
                Some(glyphs) => {
                    let to_array = (seg_count as usize - i) * 2;
                    range_offsets.push((to_array + glyph_array.len() * 2) as u16);
                    glyph_array.extend_from_slice(glyphs);
                }
                None => range_offsets.push(0),
            }
        }

        let mut sub = Vec::new();
        put_u16(&mut sub, 4);
        put_u16(&mut sub, 0); // length, patched below
        put_u16(&mut sub, 0);
        put_u16(&mut sub, seg_count * 2);
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2u16 << entry_selector;
        put_u16(&mut sub, search_range);
        put_u16(&mut sub, entry_selector);
        put_u16(&mut sub, seg_count * 2 - search_range);
        for s in &segments {
            put_u16(&mut sub, s.1);
        }
        put_u16(&mut sub, 0);
        for s in &segments {
            put_u16(&mut sub, s.0);
        }
        for s in &segments {
            put_i16(&mut sub, s.2);
        }
        for &r in &range_offsets {
            put_u16(&mut sub, r);
        }
        for &g in &glyph_array {
            put_u16(&mut sub, g);
        }
        let len = sub.len() as u16;
        sub[2..4].copy_from_slice(&len.to_be_bytes());

        let mut t = Vec::new();
        put_u16(&mut t, 0);
        put_u16(&mut t, 1);
        put_u16(&mut t, 3);
        put_u16(&mut t, 1);
        put_u32(&mut t, 12);
        t.extend_from_slice(&sub);
        t
    }

    fn kern_table(&self) -> Vec<u8> {
        let mut pairs = self.kerning.clone();
        pairs.sort_by_key(|&(l, r, _)| (u32::from(l) << 16) | u32::from(r));

        let mut t = Vec::new();
        put_u16(&mut t, 0);
        put_u16(&mut t, 1);
        put_u16(&mut t, 0);
        put_u16(&mut t, (14 + pairs.len() * 6) as u16);
        put_u16(&mut t, 0x0001);
        put_u16(&mut t, pairs.len() as u16);
        t.extend_from_slice(&[0; 6]);
        for (l, r, v) in pairs {
            put_u16(&mut t, l);
            put_u16(&mut t, r);
            put_i16(&mut t, v);
        }
        t
    }
}

/// Byte range of table `tag` in a built font
pub fn table_range(font: &[u8], tag: &[u8; 4]) -> std::ops::Range<usize> {
    let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
    for i in 0..num_tables {
        let rec = &font[12 + i * 16..28 + i * 16];
        if &rec[..4] == tag {
            let offset = u32::from_be_bytes([rec[8], rec[9], rec[10], rec[11]]) as usize;
            let length = u32::from_be_bytes([rec[12], rec[13], rec[14], rec[15]]) as usize;
            return offset..offset + length;
        }
    }
    panic!("table {:?} not in font", std::str::from_utf8(tag));
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}
