use crate::Result;

/// Compiled line program owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Vertex buffer owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// GPU operations needed to draw projected geometry as line strips.
///
/// Vertices are tightly packed clip-space `[x, y]` pairs of `f32`.
pub trait RenderBackend {
    /// Compiles and links a program from vertex and fragment shader sources
    fn compile_program(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramHandle>;

    fn create_buffer(&mut self) -> Result<BufferHandle>;

    /// Replaces the contents of `buffer`
    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &[f32]) -> Result<()>;

    /// Draws `count` vertices starting at vertex `first` as one line strip
    fn draw_line_strip(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        first: u32,
        count: u32,
    ) -> Result<()>;

    fn delete_program(&mut self, program: ProgramHandle);

    fn delete_buffer(&mut self, buffer: BufferHandle);
}
