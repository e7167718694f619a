// Image loader - stages boot images into their physical load addresses
//
// Each descriptor names an image, where it goes and how large it may be.
// Image 0 is the kernel. Image 1, if present, is the parameter image: it is
// staged in a scratch buffer and merged into its base instead of being
// copied straight there. The single-image boot is the one-descriptor case.

use log::{info, warn};

use crate::error::LoadError;
use crate::platform::{ImageMerge, ImageSource, PhysMemory};

pub const MAX_BOOT_IMAGES: usize = 4;

/// Index of the image that is merged rather than copied.
const PARAM_IMAGE: usize = 1;

/// One image to stage
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor<'a> {
    pub name: &'a str,
    /// Physical load address
    pub base: u32,
    /// Size budget in bytes
    pub max_size: u32,
    /// Actual length, filled in once loaded
    pub full_size: u32,
}

impl<'a> ImageDescriptor<'a> {
    pub const fn new(name: &'a str, base: u32, max_size: u32) -> Self {
        Self {
            name,
            base,
            max_size,
            full_size: 0,
        }
    }
}

/// Script blob copied next to the images
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScriptRegion {
    pub source: u32,
    pub dest: u32,
    pub size: u32,
}

/// Ordered set of images for one boot
#[derive(Clone, Debug)]
pub struct BootImageSet<'a> {
    images: [Option<ImageDescriptor<'a>>; MAX_BOOT_IMAGES],
    count: usize,
    pub script: Option<ScriptRegion>,
}

impl<'a> BootImageSet<'a> {
    pub const fn new() -> Self {
        Self {
            images: [None; MAX_BOOT_IMAGES],
            count: 0,
            script: None,
        }
    }

    /// One kernel image, no parameter image, no script.
    pub fn single(name: &'a str, base: u32, max_size: u32) -> Self {
        let mut set = Self::new();
        set.images[0] = Some(ImageDescriptor::new(name, base, max_size));
        set.count = 1;
        set
    }

    pub fn add_image(&mut self, image: ImageDescriptor<'a>) -> Result<(), LoadError> {
        if self.count >= MAX_BOOT_IMAGES {
            return Err(LoadError::TooManyImages);
        }
        self.images[self.count] = Some(image);
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&ImageDescriptor<'a>> {
        if index < self.count {
            self.images[index].as_ref()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageDescriptor<'a>> {
        self.images[..self.count].iter().filter_map(|i| i.as_ref())
    }
}

impl Default for BootImageSet<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an image ended up
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadedImage<'a> {
    pub name: &'a str,
    pub load_address: u32,
    pub length: u32,
}

/// Entry and parameter addresses for the handoff
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadedKernel {
    pub kernel_addr: u32,
    pub param_addr: u32,
}

/// Open image that is closed on every exit path.
struct OpenImage<'s, F: ImageSource> {
    source: &'s mut F,
    handle: Option<F::Handle>,
}

impl<'s, F: ImageSource> OpenImage<'s, F> {
    fn open(source: &'s mut F, name: &str) -> Option<Self> {
        let handle = source.open(name)?;
        Some(Self {
            source,
            handle: Some(handle),
        })
    }

    fn length(&mut self) -> usize {
        match self.handle.as_ref() {
            Some(h) => self.source.length(h),
            None => 0,
        }
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        match self.handle.as_mut() {
            Some(h) => self.source.read(h, dst),
            None => 0,
        }
    }
}

impl<F: ImageSource> Drop for OpenImage<'_, F> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.source.close(handle);
        }
    }
}

/// Open `image` and check its length against the size budget.
fn open_checked<'s, F: ImageSource>(
    source: &'s mut F,
    image: &ImageDescriptor<'_>,
) -> Result<(OpenImage<'s, F>, usize), LoadError> {
    let mut file = match OpenImage::open(source, image.name) {
        Some(f) => f,
        None => {
            warn!("cannot open image {}", image.name);
            return Err(LoadError::ImageOpenFailure);
        }
    };

    let length = file.length();
    if length > image.max_size as usize {
        warn!(
            "image {} is {} bytes, budget is {}",
            image.name, length, image.max_size
        );
        return Err(LoadError::ImageSizeExceeded);
    }
    Ok((file, length))
}

/// Read the whole image into `buffer`, which is exactly its validated length.
fn read_all<F: ImageSource>(
    file: &mut OpenImage<'_, F>,
    name: &str,
    buffer: Option<&mut [u8]>,
) -> Result<(), LoadError> {
    let buffer = buffer.ok_or(LoadError::DestinationUnavailable)?;
    if file.read(buffer) != buffer.len() {
        warn!("short read on image {}", name);
        return Err(LoadError::ImageReadFailure);
    }
    Ok(())
}

/// Stage every image of `set` and return the handoff addresses.
///
/// * `scratch` - staging buffer for the parameter image (unused with one image)
/// * `default_param` - parameter address when the set has no parameter image
pub fn load_images<F, M>(
    source: &mut F,
    board: &mut M,
    set: &mut BootImageSet<'_>,
    scratch: &mut [u8],
    default_param: u32,
) -> Result<LoadedKernel, LoadError>
where
    F: ImageSource,
    M: PhysMemory + ImageMerge,
{
    if set.is_empty() {
        return Err(LoadError::NoImages);
    }
    info!("staging {} image(s)", set.len());

    for index in 0..set.count {
        let Some(image) = set.images[index].as_mut() else {
            continue;
        };

        let (mut file, length) = open_checked(source, image)?;
        if index == PARAM_IMAGE {
            read_all(&mut file, image.name, scratch.get_mut(..length))?;
            drop(file);
            if !board.merge(image.base, &scratch[..length]) {
                warn!("merge of {} into {:#x} failed", image.name, image.base);
                return Err(LoadError::MergeFailure);
            }
        } else {
            read_all(&mut file, image.name, board.region_mut(image.base, length))?;
        }

        image.full_size = length as u32;
        let loaded = LoadedImage {
            name: image.name,
            load_address: image.base,
            length: image.full_size,
        };
        info!(
            "loaded {} ({} bytes) at {:#x}",
            loaded.name, loaded.length, loaded.load_address
        );
    }

    match set.script {
        Some(script) => {
            if !board.copy(script.source, script.dest, script.size as usize) {
                warn!("script copy to {:#x} failed", script.dest);
                return Err(LoadError::DestinationUnavailable);
            }
        }
        None => info!("no script region, skipping script copy"),
    }

    let kernel_addr = set.images[0].map(|i| i.base).ok_or(LoadError::NoImages)?;
    let param_addr = set
        .get(PARAM_IMAGE)
        .map(|i| i.base)
        .unwrap_or(default_param);

    info!("kernel staged at {:#x}, params at {:#x}", kernel_addr, param_addr);
    Ok(LoadedKernel {
        kernel_addr,
        param_addr,
    })
}
