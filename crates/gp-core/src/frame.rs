use crate::charset::{Symbol, glyph};
use crate::error::CoreError;

/// Grille 2D row-major, une valeur par cellule de caractère.
///
/// Les dimensions sont validées à la construction : jamais nulles, aire
/// représentable en `usize`.
///
/// # Example
/// ```
/// use gp_core::frame::Grid;
/// let mut grid: Grid<u8> = Grid::new(4, 2).unwrap();
/// grid.set(3, 1, 9);
/// assert_eq!(grid.get(3, 1), 9);
/// assert_eq!(grid.area(), 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    cells: Vec<T>,
    width: usize,
    height: usize,
}

/// Trame 8 bits en niveaux de gris, aux dimensions de la sortie.
pub type GrayFrame = Grid<u8>;

/// Échantillons réels mutables pendant le tramage.
pub type IntensityGrid = Grid<f64>;

/// Trame quantifiée, valeurs dans `0..NUM_SYMBOLS`.
pub type QuantizedFrame = Grid<Symbol>;

/// Checked `width * height`.
///
/// # Errors
/// Returns `InvalidDimensions` when either side is zero or the product overflows.
pub fn checked_area(width: usize, height: usize) -> Result<usize, CoreError> {
    match width.checked_mul(height) {
        Some(area) if area > 0 => Ok(area),
        _ => Err(CoreError::InvalidDimensions { width, height }),
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Grille pré-allouée, remplie de `T::default()`.
    ///
    /// # Errors
    /// Returns `InvalidDimensions` for a zero-sized or overflowing grid.
    pub fn new(width: usize, height: usize) -> Result<Self, CoreError> {
        let area = checked_area(width, height)?;
        Ok(Self {
            cells: vec![T::default(); area],
            width,
            height,
        })
    }
}

impl<T: Copy> Grid<T> {
    /// Wrap an existing row-major buffer.
    ///
    /// # Errors
    /// Returns `InvalidDimensions` for a zero-sized grid and `BufferLength`
    /// when `cells.len()` is not `width * height`.
    ///
    /// # Example
    /// ```
    /// use gp_core::frame::Grid;
    /// assert!(Grid::from_vec(2, 2, vec![0u8; 4]).is_ok());
    /// assert!(Grid::from_vec(2, 2, vec![0u8; 3]).is_err());
    /// ```
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Result<Self, CoreError> {
        let area = checked_area(width, height)?;
        if cells.len() != area {
            return Err(CoreError::BufferLength {
                expected: area,
                actual: cells.len(),
            });
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Build from nested rows, which must all have the same non-zero length.
    ///
    /// # Errors
    /// Returns `InvalidDimensions` for empty input and `DimensionMismatch` for ragged rows.
    ///
    /// # Example
    /// ```
    /// use gp_core::frame::Grid;
    /// let grid = Grid::from_rows(&[[1u8, 2], [3, 4]]).unwrap();
    /// assert_eq!(grid.get(0, 1), 3);
    /// ```
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, CoreError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let area = checked_area(width, height)?;
        let mut cells = Vec::with_capacity(area);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(CoreError::DimensionMismatch {
                    expected_width: width,
                    expected_height: height,
                    width: row.len(),
                    height,
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Width in cells.
    #[inline(always)]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[inline(always)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `width * height`, never zero.
    #[inline(always)]
    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Cellules en ordre raster (row-major).
    #[inline(always)]
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Mutable raster view.
    #[inline(always)]
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Consume the grid, returning its raster buffer.
    #[must_use]
    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }

    /// Rows, top to bottom.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.cells.chunks_exact(self.width)
    }

    /// Valeur en (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width && y < self.height, "cell out of bounds");
        self.cells[y * self.width + x]
    }

    /// Write a cell at (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(x < self.width && y < self.height, "cell out of bounds");
        self.cells[y * self.width + x] = value;
    }

    /// Vérifie que la grille a les dimensions configurées.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` otherwise.
    pub fn ensure_dimensions(&self, width: usize, height: usize) -> Result<(), CoreError> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(CoreError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Apply `f` to every cell, keeping the dimensions.
    #[must_use]
    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            cells: self.cells.iter().copied().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl Grid<Symbol> {
    /// Rendu texte avec le jeu de glyphes fixe, une ligne par rangée.
    ///
    /// Out-of-range symbols render as `?`.
    ///
    /// # Example
    /// ```
    /// use gp_core::frame::Grid;
    /// let frame = Grid::from_rows(&[[0u8, 6], [3, 1]]).unwrap();
    /// assert_eq!(frame.to_ascii(), " @\nS,\n");
    /// ```
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.rows() {
            out.extend(row.iter().map(|&s| glyph(s).unwrap_or('?')));
            out.push('\n');
        }
        out
    }
}
