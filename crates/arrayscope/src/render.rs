//! Text rendering of values and type layouts for the command line.
//!
//! Values are printed the way a debugger's variable view expands them:
//!
//! ```text
//! grid = size=2, capacity=2
//!   [0] = size=2, capacity=4
//!     [0] = 1
//!     [1] = 2
//!   [1] = size=1, capacity=1
//!     [0] = 3
//! ```

use std::io::{self, Write};

use arrayscope_core::formatters::FormatterRegistry;
use arrayscope_core::types::{TypeDescriptor, TypeKind};
use arrayscope_core::ValueObject;
use arrayscope_utils::trace;

const INDENT: &str = "  ";

/// Limits applied while expanding children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions
{
    /// Children printed per container before eliding the rest
    pub max_children: u64,
    /// Container levels to expand; `0` prints only the top summary
    pub depth: usize,
}

impl Default for RenderOptions
{
    fn default() -> Self
    {
        Self {
            max_children: 64,
            depth: 2,
        }
    }
}

/// Print `value` and, through the registry, its synthetic children
///
/// ## Errors
///
/// Only write errors on `out`. Unreadable target memory is rendered, not
/// reported.
pub fn render_value<W: Write>(
    out: &mut W,
    registry: &FormatterRegistry,
    value: &ValueObject,
    options: &RenderOptions,
) -> io::Result<()>
{
    render_at(out, registry, value, options, 0)
}

fn render_at<W: Write>(
    out: &mut W,
    registry: &FormatterRegistry,
    value: &ValueObject,
    options: &RenderOptions,
    level: usize,
) -> io::Result<()>
{
    let indent = INDENT.repeat(level);
    let text = registry.summarize(value).unwrap_or_else(|| value.format_value());
    writeln!(out, "{indent}{} = {text}", value.name())?;

    if level >= options.depth {
        return Ok(());
    }
    let Some(provider) = registry.synthetic_for(value) else {
        return Ok(());
    };
    if !provider.has_children() {
        return Ok(());
    }

    let total = provider.num_children();
    let shown = total.min(options.max_children);
    trace!(value = value.name(), total, shown, "expanding children");
    for index in 0..shown {
        let Ok(index) = i64::try_from(index) else {
            break;
        };
        match provider.child_at_index(index) {
            Some(child) => render_at(out, registry, &child, options, level + 1)?,
            None => writeln!(out, "{indent}{INDENT}[{index}] = <unavailable>")?,
        }
    }
    if total > shown {
        writeln!(out, "{indent}{INDENT}... ({} more)", total - shown)?;
    }
    Ok(())
}

/// Print a type's layout: size, kind and direct members with offsets
///
/// ## Errors
///
/// Only write errors on `out`.
pub fn render_layout<W: Write>(out: &mut W, ty: &TypeDescriptor) -> io::Result<()>
{
    let canonical = ty.canonical();
    if canonical.name == ty.name {
        write!(out, "{}", ty.name)?;
    } else {
        write!(out, "{} = {}", ty.name, canonical.name)?;
    }
    writeln!(out, " ({})", size_text(ty.resolved_byte_size()))?;

    match &canonical.kind {
        TypeKind::Struct { fields } => {
            let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
            for field in fields {
                writeln!(
                    out,
                    "{INDENT}+{:<4} {:<width$}  {} ({})",
                    field.offset,
                    field.name,
                    field.ty.name,
                    size_text(field.ty.resolved_byte_size()),
                )?;
            }
        }
        TypeKind::Pointer { pointee } => {
            let target = pointee.as_ref().map_or("void", |p| p.name.as_str());
            writeln!(out, "{INDENT}pointer to {target}")?;
        }
        TypeKind::Array { element, count } => {
            let count = count.map_or_else(|| "?".to_string(), |c| c.to_string());
            writeln!(out, "{INDENT}array of {count} x {}", element.name)?;
        }
        TypeKind::Base(encoding) => writeln!(out, "{INDENT}{encoding:?} scalar")?,
        TypeKind::Enum => writeln!(out, "{INDENT}enumeration")?,
        TypeKind::Alias { .. } | TypeKind::Unknown => writeln!(out, "{INDENT}incomplete type")?,
    }
    Ok(())
}

fn size_text(size: Option<u64>) -> String
{
    match size {
        Some(1) => "1 byte".to_string(),
        Some(n) => format!("{n} bytes"),
        None => "unknown size".to_string(),
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use arrayscope_core::formatters::FormatterConfig;
    use arrayscope_core::memory::SnapshotMemory;
    use arrayscope_core::types::{Address, BaseEncoding, FieldDescriptor};

    use super::*;

    fn int() -> Arc<TypeDescriptor>
    {
        TypeDescriptor::base("int", 4, BaseEncoding::Signed)
    }

    fn array_of(element: Arc<TypeDescriptor>) -> Arc<TypeDescriptor>
    {
        let ulong = TypeDescriptor::base("unsigned long", 8, BaseEncoding::Unsigned);
        TypeDescriptor::structure(format!("cmn::IllegalArray<{}>", element.name), 24, vec![
            FieldDescriptor::new("_ptr", 0, TypeDescriptor::pointer_to(Some(element), 8)),
            FieldDescriptor::new("_capacity", 8, ulong.clone()),
            FieldDescriptor::new("_size", 16, ulong),
        ])
    }

    fn header(ptr: u64, size: u64, capacity: u64) -> Vec<u8>
    {
        [ptr.to_le_bytes(), capacity.to_le_bytes(), size.to_le_bytes()].concat()
    }

    fn ints(values: &[i32]) -> Vec<u8>
    {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn registry() -> FormatterRegistry
    {
        let mut registry = FormatterRegistry::new();
        registry.install_illegal_array(&FormatterConfig::default()).unwrap();
        registry
    }

    fn render(value: &ValueObject, options: &RenderOptions) -> String
    {
        let mut out = Vec::new();
        render_value(&mut out, &registry(), value, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn flat_array(size: u64, elements: &[i32]) -> ValueObject
    {
        let mut memory = SnapshotMemory::new();
        memory.map(Address::from(0x1000), header(0x2000, size, 8));
        memory.map(Address::from(0x2000), ints(elements));
        ValueObject::new("arr", Address::from(0x1000), array_of(int()), Arc::new(memory))
    }

    #[test]
    fn test_flat_array()
    {
        let text = render(&flat_array(3, &[10, 20, 30]), &RenderOptions::default());
        assert_eq!(text, "arr = size=3, capacity=8\n  [0] = 10\n  [1] = 20\n  [2] = 30\n");
    }

    #[test]
    fn test_max_children_elides()
    {
        let options = RenderOptions {
            max_children: 2,
            depth: 1,
        };
        let text = render(&flat_array(5, &[1, 2, 3, 4, 5]), &options);
        assert_eq!(text, "arr = size=5, capacity=8\n  [0] = 1\n  [1] = 2\n  ... (3 more)\n");
    }

    #[test]
    fn test_depth_zero_prints_summary_only()
    {
        let options = RenderOptions {
            max_children: 10,
            depth: 0,
        };
        assert_eq!(render(&flat_array(3, &[1, 2, 3]), &options), "arr = size=3, capacity=8\n");
    }

    #[test]
    fn test_nested_arrays()
    {
        let mut memory = SnapshotMemory::new();
        memory.map(Address::from(0x1000), header(0x2000, 2, 2));
        memory.map(Address::from(0x2000), [header(0x3000, 2, 4), header(0x4000, 1, 1)].concat());
        memory.map(Address::from(0x3000), ints(&[1, 2]));
        memory.map(Address::from(0x4000), ints(&[3]));
        let grid = ValueObject::new("grid", Address::from(0x1000), array_of(array_of(int())), Arc::new(memory));

        let text = render(&grid, &RenderOptions::default());
        assert_eq!(
            text,
            "grid = size=2, capacity=2\n  [0] = size=2, capacity=4\n    [0] = 1\n    [1] = 2\n  [1] = size=1, \
             capacity=1\n    [0] = 3\n"
        );
    }

    #[test]
    fn test_unreadable_elements()
    {
        let mut memory = SnapshotMemory::new();
        memory.map(Address::from(0x1000), header(0x2000, 1, 1));
        let value = ValueObject::new("arr", Address::from(0x1000), array_of(int()), Arc::new(memory));
        let text = render(&value, &RenderOptions::default());
        assert_eq!(text, "arr = size=1, capacity=1\n  [0] = <unavailable>\n");
    }

    #[test]
    fn test_layout()
    {
        let mut out = Vec::new();
        render_layout(&mut out, &array_of(int())).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "cmn::IllegalArray<int> (24 bytes)");
        assert_eq!(lines[1], "  +0    _ptr       int * (8 bytes)");
        assert_eq!(lines[2], "  +8    _capacity  unsigned long (8 bytes)");
        assert_eq!(lines[3], "  +16   _size      unsigned long (8 bytes)");
    }

    #[test]
    fn test_layout_of_typedef()
    {
        let alias = TypeDescriptor::alias("IntList", Some(array_of(int())));
        let mut out = Vec::new();
        render_layout(&mut out, &alias).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("IntList = cmn::IllegalArray<int> (24 bytes)\n"));
    }
}
