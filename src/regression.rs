//! Regression jobs: reading the inputs, arranging them for the regression
//! engine, and writing the estimates back in the input's format.
//!
//! Images are arranged as grid × samples matrices, where the grid is the
//! set of voxels (NIfTI) or brainordinates (CIFTI) and the samples are
//! the remaining axes (usually time points, or components of a design
//! image). The regression mode decides which axis the regression runs
//! along:
//!
//! | mode | response | design | stored result |
//! |---|---|---|---|
//! | spatial | grid × samples | grid × components | samples × components table |
//! | temporal | samples × grid | samples × components | components × grid image |

use crate::cifti;
use crate::error::{GlmError, Result};
use crate::format::{cifti_suffix, nifti_suffix, strip_suffix, ImageFormat};
use crate::glm::{fit, DesignScaling, FitOptions};
use crate::header::NiftiHeader;
use crate::object::{fortran_order_vec, NiftiImage};
use crate::space::{cifti_same_space, nifti_same_space};
use crate::table::{read_table, write_table, NumberFormat};
use crate::typedef::XForm;
use crate::writer::WriterOptions;
use log::{debug, info};
use ndarray::{Array2, ArrayD, Axis, IxDyn, ShapeBuilder};
use std::path::{Path, PathBuf};

/// Description written into NIfTI outputs.
pub const OUTPUT_DESCRIPTION: &str = "fmri-glm";

/// The design of a regression, classified once from its file name.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Design {
    /// An image with one map per explanatory variable.
    Image(PathBuf),
    /// A text table with one row per sample and one column per explanatory variable.
    Table(PathBuf),
}

impl Design {
    /// Classify a design file: image names make an image design,
    /// anything else is read as a text table.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Design {
        let path = path.as_ref().to_owned();
        match ImageFormat::detect(&path) {
            Some(_) => Design::Image(path),
            None => Design::Table(path),
        }
    }

    /// The design file.
    pub fn path(&self) -> &Path {
        match self {
            Design::Image(p) | Design::Table(p) => p,
        }
    }

    /// The regression mode implied by this design.
    pub fn mode(&self) -> RegressionMode {
        match self {
            Design::Image(_) => RegressionMode::Spatial,
            Design::Table(_) => RegressionMode::Temporal,
        }
    }
}

/// The axis along which the regression runs.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RegressionMode {
    /// Regress spatial maps against every sample; yields a time course per map.
    Spatial,
    /// Regress time courses against every grid location; yields a map per time course.
    Temporal,
}

/// Selection of grid locations taken from a mask image.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GridMask {
    selected: Vec<bool>,
}

impl GridMask {
    /// A mask selecting every location of a grid.
    pub fn full(len: usize) -> Self {
        GridMask {
            selected: vec![true; len],
        }
    }

    /// Build the mask from an image, checking that it covers the grid of
    /// `data`. Non-zero values select a location.
    pub fn from_image(mask: &NiftiImage, data: &NiftiImage, format: ImageFormat) -> Result<Self> {
        let values = match format {
            ImageFormat::Nifti => {
                let grid = spatial_shape(data.shape());
                let shape = mask.shape();
                let matches =
                    spatial_shape(shape) == grid && shape.iter().skip(3).all(|d| *d == 1);
                if !matches {
                    return Err(GlmError::MaskShape(shape.to_vec(), data.shape().to_vec()));
                }
                fortran_order_vec(mask.data())
            }
            ImageFormat::Cifti => {
                let (_, grid) = cifti::matrix_shape(data.header())?;
                let m = cifti::matrix(mask)?;
                match m.dim() {
                    (1, n) | (n, 1) if n == grid => fortran_order_vec(&m),
                    _ => {
                        return Err(GlmError::MaskShape(
                            mask.shape().to_vec(),
                            data.shape().to_vec(),
                        ))
                    }
                }
            }
        };

        let mask = GridMask {
            selected: values.iter().map(|v| *v != 0.).collect(),
        };
        if mask.count() == 0 {
            return Err(GlmError::EmptyMask);
        }
        Ok(mask)
    }

    /// Number of grid locations.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected locations.
    pub fn count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    /// Indices of the selected locations, in grid order.
    pub fn indices(&self) -> Vec<usize> {
        self.selected
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| i)
            .collect()
    }

    /// Keep the selected rows of a grid × samples matrix.
    pub fn select(&self, grid_major: &Array2<f64>) -> Array2<f64> {
        grid_major.select(Axis(0), &self.indices())
    }

    /// Place the columns of a `n × selected` matrix back into an `n × grid`
    /// matrix, leaving unselected locations at zero.
    pub fn scatter(&self, values: &Array2<f64>) -> Array2<f64> {
        let mut full = Array2::zeros((values.nrows(), self.len()));
        for (column, index) in values.axis_iter(Axis(1)).zip(self.indices()) {
            full.column_mut(index).assign(&column);
        }
        full
    }
}

/// The spatial part of a NIfTI shape: its first three axes, padded with
/// ones when the image has fewer.
pub fn spatial_shape(shape: &[usize]) -> [usize; 3] {
    let mut spatial = [1; 3];
    for (s, d) in spatial.iter_mut().zip(shape) {
        *s = *d;
    }
    spatial
}

/// Arrange the data of an image as a grid × samples matrix.
///
/// NIfTI grids are ordered with the first axis varying fastest and every
/// axis after the third counts as a sample axis. CIFTI matrices are stored
/// samples × grid and are transposed.
pub fn grid_major(image: &NiftiImage, format: ImageFormat) -> Result<Array2<f64>> {
    let matrix = match format {
        ImageFormat::Nifti => {
            let grid: usize = spatial_shape(image.shape()).iter().product();
            let samples = image.data().len() / grid.max(1);
            Array2::from_shape_vec((grid, samples).f(), fortran_order_vec(image.data()))
                .map_err(|_| GlmError::InvalidFormat)?
        }
        ImageFormat::Cifti => cifti::matrix(image)?.reversed_axes(),
    };
    debug!("arranged image of shape {:?} as {:?}", image.shape(), matrix.dim());
    Ok(matrix)
}

/// A complete regression run, as configured on the command line.
#[derive(Debug, PartialEq, Clone)]
pub struct GlmJob {
    /// Data to regress.
    pub input: PathBuf,
    /// Explanatory variables.
    pub design: Design,
    /// Optional selection of grid locations.
    pub mask: Option<PathBuf>,
    /// Output file name; the extension is adjusted to the output format.
    pub out: PathBuf,
    /// Preparation of the design columns.
    pub design_scaling: DesignScaling,
    /// Format of the input, mask and image design.
    pub format: ImageFormat,
}

impl GlmJob {
    /// The regression mode of this job.
    pub fn mode(&self) -> RegressionMode {
        self.design.mode()
    }

    /// Check the files named by the job, before loading any of them.
    pub fn validate(&self) -> Result<()> {
        check_file("Input", &self.input, Some(self.format))?;
        match &self.design {
            Design::Image(p) => check_file("Design", p, Some(self.format))?,
            Design::Table(p) => check_file("Design", p, None)?,
        }
        if let Some(mask) = &self.mask {
            check_file("Mask", mask, Some(self.format))?;
        }
        Ok(())
    }

    /// The file the estimates are written to.
    pub fn output_path(&self) -> PathBuf {
        let out = self.out.to_string_lossy();
        let name = match (self.mode(), self.format) {
            (RegressionMode::Spatial, _) => {
                format!("{}.txt", out.strip_suffix(".txt").unwrap_or(&out))
            }
            (RegressionMode::Temporal, ImageFormat::Nifti) => {
                format!("{}.nii.gz", strip_suffix(&out, nifti_suffix(&out)))
            }
            (RegressionMode::Temporal, ImageFormat::Cifti) => {
                format!("{}.dscalar.nii", strip_suffix(&out, cifti_suffix(&out)))
            }
        };
        PathBuf::from(name)
    }

    /// Validate, load, fit and write. Returns the path of the written file.
    /// Nothing is written unless every check passes.
    pub fn run(&self) -> Result<PathBuf> {
        self.validate()?;

        let input = load(&self.input)?;
        let grid = grid_major(&input, self.format)?;
        // the dense scalar output needs the input's grid description
        let input_xml = match (self.mode(), self.format) {
            (RegressionMode::Temporal, ImageFormat::Cifti) => Some(cifti::xml(&input)?),
            _ => None,
        };

        let mask = match &self.mask {
            Some(path) => {
                info!("using mask {}", path.display());
                let image = load(path)?;
                self.check_same_space(&input, &image, "mask", path)?;
                GridMask::from_image(&image, &input, self.format)?
            }
            None => GridMask::full(grid.nrows()),
        };
        let y = mask.select(&grid);
        let options = FitOptions {
            center_response: true,
            design_scaling: self.design_scaling,
        };

        let output = self.output_path();
        match &self.design {
            Design::Image(path) => {
                let design = load(path)?;
                self.check_same_space(&input, &design, "design", path)?;
                let design_grid = grid_major(&design, self.format)?;
                if design_grid.nrows() != mask.len() {
                    return Err(GlmError::RowMismatch(grid.nrows(), design_grid.nrows()));
                }
                let h = mask.select(&design_grid);
                debug!("spatial regression of {:?} on {:?}", y.dim(), h.dim());

                let b = fit(&y, &h, options)?;
                write_table(&output, &b.t(), NumberFormat::Fixed(8))?;
                info!("wrote {}", output.display());
            }
            Design::Table(path) => {
                let h = read_table(path)?;
                info!("loaded design {} with shape {:?}", path.display(), h.dim());
                let y = y.reversed_axes();
                debug!("temporal regression of {:?} on {:?}", y.dim(), h.dim());

                let b = mask.scatter(&fit(&y, &h, options)?);
                match input_xml {
                    Some(xml) => cifti::write_dense_scalar(&output, &b, &xml)?,
                    None => write_volume(&output, &b, input.header())?,
                }
            }
        }
        Ok(output)
    }

    fn check_same_space(
        &self,
        input: &NiftiImage,
        other: &NiftiImage,
        role: &'static str,
        path: &Path,
    ) -> Result<()> {
        let same = match self.format {
            ImageFormat::Nifti => nifti_same_space(input, other),
            ImageFormat::Cifti => cifti_same_space(input, other)?,
        };
        if same {
            Ok(())
        } else {
            Err(GlmError::NotSameSpace(role, path.to_owned()))
        }
    }
}

fn check_file(role: &'static str, path: &Path, format: Option<ImageFormat>) -> Result<()> {
    if !path.is_file() {
        return Err(GlmError::MissingFile(role, path.to_owned()));
    }
    if let Some(expected) = format {
        // only the CIFTI naming is distinctive, plain NIfTI accepts any other name
        let is_cifti = ImageFormat::detect(path) == Some(ImageFormat::Cifti);
        if is_cifti != (expected == ImageFormat::Cifti) {
            return Err(GlmError::FormatMismatch(role, path.to_owned(), expected.name()));
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<NiftiImage> {
    let image = NiftiImage::from_file(path)?;
    info!("loaded {} with shape {:?}", path.display(), image.shape());
    Ok(image)
}

/// Write a components × grid matrix as a `(x, y, z, components)` volume in
/// the space of the reference header.
fn write_volume(path: &Path, estimates: &Array2<f64>, reference: &NiftiHeader) -> Result<()> {
    let reference_shape = reference.shape()?;
    let [x, y, z] = spatial_shape(&reference_shape);
    let components = estimates.nrows();
    let volume = ArrayD::from_shape_vec(
        IxDyn(&[x, y, z, components]).f(),
        fortran_order_vec(&estimates.t()),
    )
    .map_err(|_| GlmError::InvalidFormat)?;

    let mut header = NiftiHeader::default();
    header.set_affine(&reference.affine(), XForm::Mni152);
    header.pixdim[4] = 1.;
    if let Ok((space, time)) = reference.xyzt_units() {
        header.set_xyzt_units(space, time);
    }
    header.set_description_str(OUTPUT_DESCRIPTION)?;

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&volume)
}
