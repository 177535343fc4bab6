//! GL enumerants accepted by the context, and the typed enums they map to.

pub use picagl_core::texture::tokens::*;

// Errors
pub const NO_ERROR: u32 = 0;
pub const INVALID_ENUM: u32 = 0x0500;
pub const INVALID_VALUE: u32 = 0x0501;
pub const INVALID_OPERATION: u32 = 0x0502;
pub const STACK_OVERFLOW: u32 = 0x0503;
pub const STACK_UNDERFLOW: u32 = 0x0504;
pub const OUT_OF_MEMORY: u32 = 0x0505;

// Capabilities
pub const CULL_FACE: u32 = 0x0B44;
pub const DEPTH_TEST: u32 = 0x0B71;
pub const STENCIL_TEST: u32 = 0x0B90;
pub const ALPHA_TEST: u32 = 0x0BC0;
pub const BLEND: u32 = 0x0BE2;
pub const COLOR_LOGIC_OP: u32 = 0x0BF2;
pub const SCISSOR_TEST: u32 = 0x0C11;
pub const POLYGON_OFFSET_FILL: u32 = 0x8037;
/// Vendor extension: scissor that discards the inside of the box.
pub const SCISSOR_TEST_INVERTED_PICA: u32 = 0x6001;

// Matrix modes
pub const MODELVIEW: u32 = 0x1700;
pub const PROJECTION: u32 = 0x1701;
pub const TEXTURE: u32 = 0x1702;
pub const TEXTURE0: u32 = 0x84C0;
pub const MAX_TEXTURE_UNITS: u32 = 3;

// Faces
pub const FRONT: u32 = 0x0404;
pub const BACK: u32 = 0x0405;
pub const FRONT_AND_BACK: u32 = 0x0408;
pub const CW: u32 = 0x0900;
pub const CCW: u32 = 0x0901;

// Blend factors
pub const ZERO: u32 = 0;
pub const ONE: u32 = 1;
pub const SRC_COLOR: u32 = 0x0300;
pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
pub const SRC_ALPHA: u32 = 0x0302;
pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
pub const DST_ALPHA: u32 = 0x0304;
pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
pub const DST_COLOR: u32 = 0x0306;
pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
pub const SRC_ALPHA_SATURATE: u32 = 0x0308;

// Compare functions
pub const NEVER: u32 = 0x0200;
pub const LESS: u32 = 0x0201;
pub const EQUAL: u32 = 0x0202;
pub const LEQUAL: u32 = 0x0203;
pub const GREATER: u32 = 0x0204;
pub const NOTEQUAL: u32 = 0x0205;
pub const GEQUAL: u32 = 0x0206;
pub const ALWAYS: u32 = 0x0207;

// Logic ops
pub const CLEAR: u32 = 0x1500;
pub const AND: u32 = 0x1501;
pub const AND_REVERSE: u32 = 0x1502;
pub const COPY: u32 = 0x1503;
pub const AND_INVERTED: u32 = 0x1504;
pub const NOOP: u32 = 0x1505;
pub const XOR: u32 = 0x1506;
pub const OR: u32 = 0x1507;
pub const NOR: u32 = 0x1508;
pub const EQUIV: u32 = 0x1509;
pub const INVERT: u32 = 0x150A;
pub const OR_REVERSE: u32 = 0x150B;
pub const COPY_INVERTED: u32 = 0x150C;
pub const OR_INVERTED: u32 = 0x150D;
pub const NAND: u32 = 0x150E;
pub const SET: u32 = 0x150F;

// Stencil ops (INVERT is shared with the logic ops)
pub const KEEP: u32 = 0x1E00;
pub const REPLACE: u32 = 0x1E01;
pub const INCR: u32 = 0x1E02;
pub const DECR: u32 = 0x1E03;
pub const INCR_WRAP: u32 = 0x8507;
pub const DECR_WRAP: u32 = 0x8508;

/// Declares an enum backed by GL tokens with `from_token`/`token`.
macro_rules! gl_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $token:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name { $($variant),+ }

        impl $name {
            pub fn from_token(token: u32) -> Option<Self> {
                match token {
                    $(t if t == $token => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn token(self) -> u32 {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }
    };
}

gl_enum! {
    /// Depth, alpha and stencil comparison.
    pub enum CompareFunc {
        Never = NEVER,
        Less = LESS,
        Equal = EQUAL,
        LessEqual = LEQUAL,
        Greater = GREATER,
        NotEqual = NOTEQUAL,
        GreaterEqual = GEQUAL,
        Always = ALWAYS,
    }
}

gl_enum! {
    pub enum BlendFactor {
        Zero = ZERO,
        One = ONE,
        SrcColor = SRC_COLOR,
        OneMinusSrcColor = ONE_MINUS_SRC_COLOR,
        SrcAlpha = SRC_ALPHA,
        OneMinusSrcAlpha = ONE_MINUS_SRC_ALPHA,
        DstAlpha = DST_ALPHA,
        OneMinusDstAlpha = ONE_MINUS_DST_ALPHA,
        DstColor = DST_COLOR,
        OneMinusDstColor = ONE_MINUS_DST_COLOR,
        SrcAlphaSaturate = SRC_ALPHA_SATURATE,
    }
}

gl_enum! {
    pub enum LogicOp {
        Clear = CLEAR,
        And = AND,
        AndReverse = AND_REVERSE,
        Copy = COPY,
        AndInverted = AND_INVERTED,
        Noop = NOOP,
        Xor = XOR,
        Or = OR,
        Nor = NOR,
        Equiv = EQUIV,
        Invert = INVERT,
        OrReverse = OR_REVERSE,
        CopyInverted = COPY_INVERTED,
        OrInverted = OR_INVERTED,
        Nand = NAND,
        Set = SET,
    }
}

gl_enum! {
    pub enum CullFace {
        Front = FRONT,
        Back = BACK,
        FrontAndBack = FRONT_AND_BACK,
    }
}

gl_enum! {
    pub enum FrontFace {
        Clockwise = CW,
        CounterClockwise = CCW,
    }
}

gl_enum! {
    pub enum StencilOp {
        Keep = KEEP,
        Zero = ZERO,
        Replace = REPLACE,
        Incr = INCR,
        Decr = DECR,
        Invert = INVERT,
        IncrWrap = INCR_WRAP,
        DecrWrap = DECR_WRAP,
    }
}
